//! Guessing which CSV header holds the date, user, message and time values.
//!
//! Exports come from different chat clients and locales, so header names are
//! matched by case-insensitive substring against a fixed synonym list per
//! role. Each role independently takes the first header (in file order) that
//! matches one of its synonyms; a header may therefore satisfy more than one
//! role (e.g. `username_text` is both a user and a message column).

use crate::formats::ColumnMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnRole {
    Date,
    User,
    Message,
    Time,
}

/// Detection rules, evaluated in this order.
pub const COLUMN_RULES: &[(ColumnRole, &[&str])] = &[
    (ColumnRole::Date, &["date", "time", "날짜", "시간"]),
    (ColumnRole::User, &["user", "name", "사용자", "이름", "닉네임"]),
    (
        ColumnRole::Message,
        &["message", "text", "content", "메시지", "내용", "대화"],
    ),
    (ColumnRole::Time, &["time", "시간"]),
];

pub fn role_matches(role: ColumnRole, header: &str) -> bool {
    let lower = header.to_lowercase();
    COLUMN_RULES
        .iter()
        .filter(|(r, _)| *r == role)
        .flat_map(|(_, synonyms)| synonyms.iter())
        .any(|synonym| lower.contains(synonym))
}

pub fn detect_columns<S: AsRef<str>>(headers: &[S]) -> ColumnMap {
    let mut map = ColumnMap::default();

    for (role, _) in COLUMN_RULES {
        let found = headers.iter().map(AsRef::as_ref).find(|header| {
            if !role_matches(*role, header) {
                return false;
            }
            // The time role only adds information when it is not the date column.
            *role != ColumnRole::Time || map.date_col.as_deref() != Some(*header)
        });
        let found = found.map(str::to_owned);

        match role {
            ColumnRole::Date => map.date_col = found,
            ColumnRole::User => map.user_col = found,
            ColumnRole::Message => map.message_col = found,
            ColumnRole::Time => map.time_col = found,
        }
    }

    map
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detects_english_headers() {
        let map = detect_columns(&["Date", "User", "Message"]);
        assert_eq!(map.date_col.as_deref(), Some("Date"));
        assert_eq!(map.user_col.as_deref(), Some("User"));
        assert_eq!(map.message_col.as_deref(), Some("Message"));
        assert_eq!(map.time_col, None);
    }

    #[test]
    fn detects_korean_headers() {
        let map = detect_columns(&["날짜", "사용자", "메시지"]);
        assert_eq!(map.date_col.as_deref(), Some("날짜"));
        assert_eq!(map.user_col.as_deref(), Some("사용자"));
        assert_eq!(map.message_col.as_deref(), Some("메시지"));

        let map = detect_columns(&["시간", "닉네임", "대화"]);
        assert_eq!(map.date_col.as_deref(), Some("시간"));
        assert_eq!(map.user_col.as_deref(), Some("닉네임"));
        assert_eq!(map.message_col.as_deref(), Some("대화"));

        let map = detect_columns(&["날짜", "이름", "내용"]);
        assert_eq!(map.user_col.as_deref(), Some("이름"));
        assert_eq!(map.message_col.as_deref(), Some("내용"));
    }

    #[test]
    fn matching_is_case_insensitive_substring() {
        let map = detect_columns(&["TIMESTAMP", "Sender Name", "Message Text"]);
        assert_eq!(map.date_col.as_deref(), Some("TIMESTAMP"));
        assert_eq!(map.user_col.as_deref(), Some("Sender Name"));
        assert_eq!(map.message_col.as_deref(), Some("Message Text"));
    }

    #[test]
    fn first_matching_header_wins() {
        let map = detect_columns(&["Date", "Time", "User", "Message"]);
        assert_eq!(map.date_col.as_deref(), Some("Date"));
        assert_eq!(map.time_col.as_deref(), Some("Time"));
    }

    #[test]
    fn time_role_never_repeats_the_date_column() {
        let map = detect_columns(&["Time", "User", "Message"]);
        assert_eq!(map.date_col.as_deref(), Some("Time"));
        assert_eq!(map.time_col, None);
    }

    #[test]
    fn one_header_may_fill_two_roles() {
        let map = detect_columns(&["Date", "username_text"]);
        assert_eq!(map.user_col.as_deref(), Some("username_text"));
        assert_eq!(map.message_col.as_deref(), Some("username_text"));
    }

    #[test]
    fn every_synonym_is_detected_for_its_role() {
        for (role, synonyms) in COLUMN_RULES {
            for &synonym in *synonyms {
                assert!(role_matches(*role, synonym), "{role:?} {synonym}");
                assert!(
                    role_matches(*role, &synonym.to_uppercase()),
                    "{role:?} {synonym} uppercase"
                );
                assert!(
                    role_matches(*role, &format!("chat {synonym} col")),
                    "{role:?} {synonym} embedded"
                );

                let map = match role {
                    ColumnRole::Date => detect_columns(&[synonym]),
                    _ => detect_columns(&["date", synonym]),
                };
                let detected = match role {
                    ColumnRole::Date => map.date_col,
                    ColumnRole::User => map.user_col,
                    ColumnRole::Message => map.message_col,
                    ColumnRole::Time => map.time_col,
                };
                assert_eq!(detected.as_deref(), Some(synonym), "{role:?} {synonym}");
            }
        }
    }

    #[test]
    fn unrelated_headers_match_no_role() {
        for role in [
            ColumnRole::Date,
            ColumnRole::User,
            ColumnRole::Message,
            ColumnRole::Time,
        ] {
            assert!(!role_matches(role, "id"));
            assert!(!role_matches(role, "channel"));
        }
    }

    #[test]
    fn missing_date_column_is_reported_as_none() {
        let map = detect_columns(&["User", "Message"]);
        assert_eq!(map.date_col, None);
        assert_eq!(map.user_col.as_deref(), Some("User"));
    }
}
