use chrono::{Local, NaiveDate};
use regex::Regex;
use std::sync::OnceLock;

/// Short is the `MMDDYY` stamp used in dump file names, Long is `MM/DD/YYYY`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DateFormat {
    Short,
    Long,
}

impl DateFormat {
    fn pattern(self) -> &'static str {
        match self {
            DateFormat::Short => "%m%d%y",
            DateFormat::Long => "%m/%d/%Y",
        }
    }
}

pub fn today(format: DateFormat) -> String {
    format_date(Local::now().date_naive(), format)
}

pub fn format_date(date: NaiveDate, format: DateFormat) -> String {
    date.format(format.pattern()).to_string()
}

/// `raw_<source>_dump_<MMDDYY>.json`
pub fn dump_file_name(source: &str, date: NaiveDate) -> String {
    format!("raw_{}_dump_{}.json", source, format_date(date, DateFormat::Short))
}

/// 從檔名結尾的 MMDDYY 取回日期
pub fn parse_dump_date(file_name: &str) -> Option<NaiveDate> {
    static STAMP: OnceLock<Regex> = OnceLock::new();
    let re = STAMP.get_or_init(|| Regex::new(r"([0-9]+)\.json$").expect("valid regex"));

    let digits = re.captures(file_name)?.get(1)?.as_str();
    NaiveDate::parse_from_str(digits, DateFormat::Short.pattern()).ok()
}
