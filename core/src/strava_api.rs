// core/src/strava_api.rs
use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use ureq::Agent;

use crate::error::{CoreError, CoreResult};
use crate::models::{Sample, SessionMeta, Stream};

const API_BASE: &str = "https://www.strava.com/api/v3";
const STREAM_KEYS: &str = "time,velocity_smooth,heartrate,altitude";

/// Svar fra `/activities/{id}/streams?key_by_type=true`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct StravaStreams {
    time: Option<Channel>,
    #[serde(default)]
    velocity_smooth: Option<Channel>,
    #[serde(default)]
    heartrate: Option<Channel>,
    #[serde(default)]
    altitude: Option<Channel>,
}

#[derive(Debug, Clone, Default, Deserialize)]
struct Channel {
    #[serde(default)]
    data: Vec<Option<f64>>,
}

impl StravaStreams {
    /// Gjør kanalene om til en strøm. `time` er påkrevd; manglende eller
    /// kortere kanaler gir hull. Fart kommer i m/s og lagres som km/t.
    pub fn into_stream(self) -> CoreResult<Stream> {
        let time = self.time.ok_or_else(|| CoreError::MissingColumn("time".into()))?.data;
        let at = |ch: &Option<Channel>, i: usize| {
            ch.as_ref().and_then(|c| c.data.get(i).copied().flatten())
        };

        let mut samples = Vec::with_capacity(time.len());
        for (i, t) in time.iter().enumerate() {
            let Some(time_s) = *t else {
                return Err(CoreError::MalformedValue {
                    row: i,
                    column: "time".into(),
                    value: "null".into(),
                });
            };
            samples.push(Sample {
                time_s,
                speed_kmh: at(&self.velocity_smooth, i).map(|ms| ms * 3.6),
                bpm: at(&self.heartrate, i),
                altitude_m: at(&self.altitude, i),
            });
        }
        Stream::new(samples)
    }
}

/// Delmengde av `/activities/{id}`.
#[derive(Debug, Clone, Deserialize)]
struct ActivityResp {
    id: u64,
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    sport_type: Option<String>,
    // eldre felt, sendes ofte sammen med sport_type
    #[serde(default, rename = "type")]
    kind: Option<String>,
    #[serde(default)]
    start_date: Option<DateTime<Utc>>,
}

impl ActivityResp {
    fn into_meta(self) -> SessionMeta {
        SessionMeta {
            activity_id: Some(self.id),
            name: self.name,
            sport_type: self.sport_type.or(self.kind),
            start_time_utc: self.start_date,
        }
    }
}

fn from_json<T: DeserializeOwned>(json: &str) -> CoreResult<T> {
    let de = &mut serde_json::Deserializer::from_str(json);
    serde_path_to_error::deserialize(de).map_err(CoreError::from_json_path)
}

/// Strømmer fra rå JSON (f.eks. lagret API-svar).
pub fn parse_streams(json: &str) -> CoreResult<Stream> {
    from_json::<StravaStreams>(json)?.into_stream()
}

pub fn parse_activity_meta(json: &str) -> CoreResult<SessionMeta> {
    Ok(from_json::<ActivityResp>(json)?.into_meta())
}

/// Strava-klient – enkel blocking-versjon (ureq). Tokenet hentes utenfor.
pub struct StravaClient {
    agent: Agent,
    base_url: String,
}

impl StravaClient {
    pub fn new() -> Self {
        Self::with_base_url(API_BASE)
    }

    pub fn with_base_url(base_url: impl Into<String>) -> Self {
        let agent = ureq::AgentBuilder::new()
            .timeout(std::time::Duration::from_secs(10))
            .build();
        Self { agent, base_url: base_url.into() }
    }

    fn get_text(
        &self,
        url: &str,
        access_token: &str,
        query: &[(&str, &str)],
    ) -> CoreResult<String> {
        let mut req = self.agent.get(url).set("Authorization", &format!("Bearer {access_token}"));
        for (k, v) in query {
            req = req.query(k, v);
        }
        let resp = req.call().map_err(|e| match e {
            ureq::Error::Status(code, _) => {
                CoreError::Upstream(format!("strava returned {code} for {url}"))
            }
            other => CoreError::Upstream(other.to_string()),
        })?;
        resp.into_string().map_err(CoreError::from)
    }

    pub fn fetch_streams(&self, activity_id: u64, access_token: &str) -> CoreResult<Stream> {
        let url = format!("{}/activities/{activity_id}/streams", self.base_url);
        let query = [("keys", STREAM_KEYS), ("key_by_type", "true")];
        let body = self.get_text(&url, access_token, &query)?;
        let stream = parse_streams(&body)?;
        log::info!("[Strava] activity={activity_id} => {} samples", stream.len());
        Ok(stream)
    }

    pub fn fetch_activity_meta(
        &self,
        activity_id: u64,
        access_token: &str,
    ) -> CoreResult<SessionMeta> {
        let url = format!("{}/activities/{activity_id}", self.base_url);
        parse_activity_meta(&self.get_text(&url, access_token, &[])?)
    }
}

impl Default for StravaClient {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn converts_velocity_and_fills_missing_channels() {
        let json = r#"{
            "time": { "data": [0, 1, 2] },
            "velocity_smooth": { "data": [2.5, null, 5.0] },
            "heartrate": { "data": [120, 121] }
        }"#;
        let s = parse_streams(json).unwrap();
        let v: Vec<_> = s.samples().iter().map(|x| x.speed_kmh).collect();
        assert_eq!(v, vec![Some(9.0), None, Some(18.0)]);
        assert_eq!(s.samples()[2].bpm, None);
        assert!(!s.has_altitude());
    }

    #[test]
    fn time_is_required() {
        let err = parse_streams(r#"{ "heartrate": { "data": [120] } }"#).unwrap_err();
        assert!(matches!(err, CoreError::MissingColumn(c) if c == "time"));
    }

    #[test]
    fn activity_meta_accepts_legacy_type() {
        let m = parse_activity_meta(
            r#"{ "id": 42, "name": "Tirsdagsintervaller", "type": "Run", "start_date": "2024-05-14T16:30:00Z" }"#,
        )
        .unwrap();
        assert_eq!(m.activity_id, Some(42));
        assert_eq!(m.sport_type.as_deref(), Some("Run"));
        assert_eq!(
            m.start_time_utc.map(|t| t.to_rfc3339()),
            Some("2024-05-14T16:30:00+00:00".into())
        );

        let both =
            parse_activity_meta(r#"{ "id": 1, "type": "Run", "sport_type": "TrailRun" }"#).unwrap();
        assert_eq!(both.sport_type.as_deref(), Some("TrailRun"));
    }
}
