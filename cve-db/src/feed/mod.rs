use chrono::{DateTime, NaiveDate, NaiveTime, Utc};

pub mod normalize;
pub mod raw;

pub const DEFAULT_FEED_URL: &str = "https://services.nvd.nist.gov/rest/json/cves/2.0";

const WINDOW_PARAM_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.3fZ";

#[derive(thiserror::Error, Debug)]
pub enum FetchError {
    #[error("could not reach the cve feed")]
    Transport(#[source] reqwest::Error),
    #[error("cve feed answered with status {0}")]
    Status(reqwest::StatusCode),
    #[error("could not decode the cve feed response")]
    Decode(#[source] reqwest::Error),
}

/// Publication-date window of one ingestion run, inclusive on both ends.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FetchWindow {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl FetchWindow {
    /// Spans from the first millisecond of `first` to the last millisecond
    /// of `last`, both taken as UTC days.
    pub fn for_dates(first: NaiveDate, last: NaiveDate) -> Self {
        let end_of_day = NaiveTime::from_hms_milli_opt(23, 59, 59, 999).expect("valid time");
        Self {
            start: first.and_time(NaiveTime::MIN).and_utc(),
            end: last.and_time(end_of_day).and_utc(),
        }
    }

    pub fn start_param(&self) -> String {
        self.start.format(WINDOW_PARAM_FORMAT).to_string()
    }

    pub fn end_param(&self) -> String {
        self.end.format(WINDOW_PARAM_FORMAT).to_string()
    }
}

pub struct FeedClient {
    base_url: String,
    client: reqwest::blocking::Client,
}

impl FeedClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            client: reqwest::blocking::Client::new(),
        }
    }

    /// One GET for the given window. No retries and no payload validation
    /// here; a bad record is the normalizer's problem.
    pub fn fetch(&self, window: &FetchWindow) -> Result<raw::FeedPage, FetchError> {
        log::info!(
            "fetching {} for window {} .. {}",
            self.base_url,
            window.start_param(),
            window.end_param()
        );

        let response = self
            .client
            .get(&self.base_url)
            .query(&[
                ("pubStartDate", window.start_param()),
                ("pubEndDate", window.end_param()),
            ])
            .send()
            .map_err(FetchError::Transport)?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status(status));
        }

        let page: raw::FeedPage = response.json().map_err(FetchError::Decode)?;
        log::info!(
            "fetched {} of {} records (start index {})",
            page.vulnerabilities.len(),
            page.total_results,
            page.start_index
        );

        Ok(page)
    }
}

impl Default for FeedClient {
    fn default() -> Self {
        Self::new(DEFAULT_FEED_URL)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn window_params_carry_millisecond_precision_and_utc_suffix() {
        let window = FetchWindow::for_dates(
            NaiveDate::from_ymd_opt(2023, 11, 8).unwrap(),
            NaiveDate::from_ymd_opt(2024, 1, 5).unwrap(),
        );

        assert_eq!(window.start_param(), "2023-11-08T00:00:00.000Z");
        assert_eq!(window.end_param(), "2024-01-05T23:59:59.999Z");
    }

    #[test]
    fn single_day_window_covers_the_whole_day() {
        let day = NaiveDate::from_ymd_opt(2024, 2, 29).unwrap();
        let window = FetchWindow::for_dates(day, day);

        assert!(window.start < window.end);
        assert_eq!(window.start_param(), "2024-02-29T00:00:00.000Z");
        assert_eq!(window.end_param(), "2024-02-29T23:59:59.999Z");
    }
}
