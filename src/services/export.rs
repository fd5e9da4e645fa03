//! Selection export (CSV and iCalendar)

use chrono::{NaiveDate, NaiveDateTime};
use csv::{Terminator, WriterBuilder};
use serde::{Deserialize, Serialize};

use crate::error::{AppError, Result};

const UTF8_BOM: &str = "\u{feff}";
const CSV_HEADER: [&str; 4] = ["Intitule", "Lien", "Date_limite", "Nom_Adresse_Acheteur"];

/// A notice selected by the user for export
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExportItem {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub href: Option<String>,
    #[serde(default)]
    pub deadline_iso: Option<String>,
    #[serde(default)]
    pub date_iso: Option<String>,
    #[serde(default)]
    pub buyer_address: Option<String>,
    #[serde(default)]
    pub buyer: Option<String>,
}

impl ExportItem {
    fn buyer_label(&self) -> &str {
        non_empty(&self.buyer_address)
            .or_else(|| non_empty(&self.buyer))
            .unwrap_or("")
    }
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|v| !v.is_empty())
}

/// Excel-friendly CSV: UTF-8 BOM, `;` delimiter, CRLF rows
pub fn to_csv(items: &[ExportItem]) -> Result<Vec<u8>> {
    let mut writer = WriterBuilder::new()
        .delimiter(b';')
        .terminator(Terminator::CRLF)
        .from_writer(Vec::from(UTF8_BOM.as_bytes()));

    writer.write_record(CSV_HEADER)?;
    for item in items {
        writer.write_record([
            item.title.as_deref().unwrap_or(""),
            item.href.as_deref().unwrap_or(""),
            item.deadline_iso.as_deref().unwrap_or(""),
            item.buyer_label(),
        ])?;
    }

    writer
        .into_inner()
        .map_err(|e| AppError::Serialization(format!("CSV buffer: {}", e.error())))
}

/// One VEVENT per item, all-day when only a date is known
pub fn to_ics(items: &[ExportItem]) -> String {
    let mut lines = vec![
        "BEGIN:VCALENDAR".to_string(),
        "VERSION:2.0".to_string(),
        "PRODID:-//BOAMP Search//FR".to_string(),
    ];

    for item in items {
        lines.push("BEGIN:VEVENT".to_string());
        lines.push(format!(
            "SUMMARY:{}",
            item.title.as_deref().unwrap_or("Avis BOAMP")
        ));

        let when = non_empty(&item.deadline_iso)
            .or_else(|| non_empty(&item.date_iso))
            .and_then(ics_moment);
        match when {
            Some(IcsMoment::Date(day)) => {
                lines.push(format!("DTSTART;VALUE=DATE:{}", day));
                lines.push(format!("DTEND;VALUE=DATE:{}", day));
            }
            Some(IcsMoment::DateTime(stamp)) => lines.push(format!("DTSTART:{}", stamp)),
            None => {}
        }

        if let Some(url) = non_empty(&item.href) {
            lines.push(format!("URL:{}", url));
        }
        if let Some(address) = non_empty(&item.buyer_address) {
            lines.push(format!("DESCRIPTION:{}", address.replace(['\r', '\n'], " ")));
        }
        lines.push("END:VEVENT".to_string());
    }

    lines.push("END:VCALENDAR".to_string());
    lines.join("\r\n")
}

enum IcsMoment {
    Date(String),
    DateTime(String),
}

fn ics_moment(value: &str) -> Option<IcsMoment> {
    if let Ok(day) = NaiveDate::parse_from_str(value, "%Y-%m-%d") {
        return Some(IcsMoment::Date(day.format("%Y%m%d").to_string()));
    }
    NaiveDateTime::parse_from_str(value, "%Y-%m-%dT%H:%M:%S")
        .ok()
        .map(|dt| IcsMoment::DateTime(dt.format("%Y%m%dT%H%M%SZ").to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(title: &str, deadline: Option<&str>) -> ExportItem {
        ExportItem {
            title: Some(title.to_string()),
            href: Some("https://www.boamp.fr/avis/detail/24-1".to_string()),
            deadline_iso: deadline.map(str::to_string),
            ..ExportItem::default()
        }
    }

    #[test]
    fn test_csv_header_and_bom() {
        let csv = String::from_utf8(to_csv(&[]).unwrap()).unwrap();
        assert_eq!(
            csv,
            "\u{feff}Intitule;Lien;Date_limite;Nom_Adresse_Acheteur\r\n"
        );
    }

    #[test]
    fn test_csv_quotes_delimiters_and_prefers_address() {
        let mut first = item("Formation; \"UX\"", Some("2024-09-30"));
        first.buyer = Some("Mairie".into());
        first.buyer_address = Some("1 rue X\nParis".into());
        let mut second = item("Audit", None);
        second.buyer = Some("Région".into());

        let csv = String::from_utf8(to_csv(&[first, second]).unwrap()).unwrap();
        let rows: Vec<&str> = csv.trim_start_matches('\u{feff}').split("\r\n").collect();

        assert_eq!(
            rows[1],
            "\"Formation; \"\"UX\"\"\";https://www.boamp.fr/avis/detail/24-1;2024-09-30;\"1 rue X\nParis\""
        );
        assert_eq!(rows[2], "Audit;https://www.boamp.fr/avis/detail/24-1;;Région");
    }

    #[test]
    fn test_ics_all_day_event() {
        let ics = to_ics(&[item("Formation", Some("2024-09-30"))]);

        assert!(ics.starts_with("BEGIN:VCALENDAR\r\nVERSION:2.0"));
        assert!(ics.contains("SUMMARY:Formation\r\n"));
        assert!(ics.contains("DTSTART;VALUE=DATE:20240930\r\nDTEND;VALUE=DATE:20240930"));
        assert!(ics.contains("URL:https://www.boamp.fr/avis/detail/24-1"));
        assert!(ics.ends_with("END:VEVENT\r\nEND:VCALENDAR"));
    }

    #[test]
    fn test_ics_falls_back_to_publication_date_and_datetime() {
        let mut by_date = item("A", None);
        by_date.date_iso = Some("2024-05-02".into());
        let timed = item("B", Some("2024-09-30T12:00:00"));
        let undated = ExportItem::default();

        let ics = to_ics(&[by_date, timed, undated]);

        assert!(ics.contains("DTSTART;VALUE=DATE:20240502"));
        assert!(ics.contains("DTSTART:20240930T120000Z"));
        assert!(ics.contains("SUMMARY:Avis BOAMP"));
        assert_eq!(ics.matches("BEGIN:VEVENT").count(), 3);
    }
}
