//! Civil-date (de)serialization in the `YYYY-MM-DD` form the API speaks.

use time::{format_description::FormatItem, macros::format_description, Date};

pub const DATE_FMT: &[FormatItem<'static>] = format_description!("[year]-[month]-[day]");

pub mod iso_date {
    use serde::{Deserialize, Deserializer, Serializer};
    use time::Date;

    use super::DATE_FMT;

    pub fn serialize<S: Serializer>(date: &Date, serializer: S) -> Result<S::Ok, S::Error> {
        let s = date.format(DATE_FMT).map_err(serde::ser::Error::custom)?;
        serializer.serialize_str(&s)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Date, D::Error> {
        let s = String::deserialize(deserializer)?;
        Date::parse(&s, DATE_FMT).map_err(serde::de::Error::custom)
    }

    pub mod option {
        use serde::{Deserialize, Deserializer, Serializer};
        use time::Date;

        use super::DATE_FMT;

        pub fn serialize<S: Serializer>(
            date: &Option<Date>,
            serializer: S,
        ) -> Result<S::Ok, S::Error> {
            match date {
                Some(d) => super::serialize(d, serializer),
                None => serializer.serialize_none(),
            }
        }

        pub fn deserialize<'de, D: Deserializer<'de>>(
            deserializer: D,
        ) -> Result<Option<Date>, D::Error> {
            let s = Option::<String>::deserialize(deserializer)?;
            match s.as_deref() {
                None | Some("") => Ok(None),
                Some(s) => Date::parse(s, DATE_FMT)
                    .map(Some)
                    .map_err(serde::de::Error::custom),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use serde::{Deserialize, Serialize};
    use time::macros::date;

    #[derive(Serialize, Deserialize)]
    struct Wrapper {
        #[serde(with = "super::iso_date")]
        date: time::Date,
        #[serde(default, with = "super::iso_date::option")]
        maybe: Option<time::Date>,
    }

    #[test]
    fn round_trips_iso_dates() {
        let w: Wrapper = serde_json::from_str(r#"{"date":"2025-03-01"}"#).unwrap();
        assert_eq!(w.date, date!(2025 - 03 - 01));
        assert_eq!(w.maybe, None);
        let s = serde_json::to_string(&w).unwrap();
        assert!(s.contains("\"2025-03-01\""));
    }

    #[test]
    fn rejects_garbage() {
        assert!(serde_json::from_str::<Wrapper>(r#"{"date":"tomorrow"}"#).is_err());
    }

    #[test]
    fn empty_string_is_none() {
        let w: Wrapper =
            serde_json::from_str(r#"{"date":"2025-03-01","maybe":""}"#).unwrap();
        assert_eq!(w.maybe, None);
    }
}
