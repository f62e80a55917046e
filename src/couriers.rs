use anyhow::{Context, Result};
use reqwest::Url;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Courier {
    pub code: &'static str,
    pub name: &'static str,
}

/// Couriers the upstream API accepts
pub const KNOWN_COURIERS: &[Courier] = &[
    Courier { code: "jne", name: "JNE" },
    Courier { code: "jnt", name: "J&T Express" },
    Courier { code: "spx", name: "Shopee Express" },
    Courier { code: "sicepat", name: "Sicepat Express" },
    Courier { code: "pos", name: "POS Indonesia" },
    Courier { code: "anteraja", name: "Anteraja" },
    Courier { code: "ninja", name: "Ninja Express" },
    Courier { code: "lion", name: "Lion Parcel" },
    Courier { code: "sap", name: "SAP Express" },
    Courier { code: "ide", name: "ID Express" },
    Courier { code: "wahana", name: "Wahana" },
    Courier { code: "lex", name: "Lazada Express" },
    Courier { code: "tiki", name: "Tiki" },
];

pub fn find_courier(code: &str) -> Option<&'static Courier> {
    KNOWN_COURIERS
        .iter()
        .find(|courier| courier.code.eq_ignore_ascii_case(code.trim()))
}

/// Link that reopens a tracking result: `{base}?courier=..&noresi=..`
pub fn share_link(base: &str, awb: &str, courier: &str) -> Result<String> {
    let mut url = Url::parse(base).with_context(|| format!("Invalid share base URL: {base}"))?;
    url.query_pairs_mut()
        .clear()
        .append_pair("courier", courier)
        .append_pair("noresi", awb);
    Ok(url.into())
}

/// Extract `(awb, courier)` from a share link, if both are present.
pub fn parse_share_link(link: &str) -> Result<Option<(String, String)>> {
    let url = Url::parse(link).with_context(|| format!("Invalid share link: {link}"))?;

    let mut awb = None;
    let mut courier = None;
    for (key, value) in url.query_pairs() {
        match key.as_ref() {
            "noresi" => awb = Some(value.into_owned()),
            "courier" => courier = Some(value.into_owned()),
            _ => {}
        }
    }

    Ok(match (awb, courier) {
        (Some(awb), Some(courier)) if !awb.is_empty() && !courier.is_empty() => {
            Some((awb, courier))
        }
        _ => None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lookup_ignores_case() {
        assert_eq!(find_courier("JNE").map(|c| c.name), Some("JNE"));
        assert_eq!(find_courier(" sicepat ").map(|c| c.code), Some("sicepat"));
        assert!(find_courier("dhl").is_none());
    }

    #[test]
    fn share_link_round_trips() {
        let link = share_link("https://track.example/", "JX 123&4", "jnt").unwrap();
        assert_eq!(
            parse_share_link(&link).unwrap(),
            Some(("JX 123&4".to_string(), "jnt".to_string()))
        );
    }

    #[test]
    fn share_link_replaces_existing_query() {
        let link = share_link("https://track.example/?theme=dark", "1", "pos").unwrap();
        assert_eq!(link, "https://track.example/?courier=pos&noresi=1");
    }

    #[test]
    fn incomplete_link_yields_none() {
        assert_eq!(parse_share_link("https://track.example/?courier=jne").unwrap(), None);
        assert_eq!(
            parse_share_link("https://track.example/?courier=jne&noresi=").unwrap(),
            None
        );
    }
}
