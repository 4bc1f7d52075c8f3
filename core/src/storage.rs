use std::fs::File;
use std::io::{Read, Write};
use std::path::{Path, PathBuf};

use crate::config::AnalysisConfig;
use crate::error::{CoreError, CoreResult};
use crate::models::{Sample, SessionMeta, Stream};

const COL_TIME: &str = "time_s";
const COL_SPEED: &str = "speed_kmh";
const COL_BPM: &str = "bpm";
const COL_ALTITUDE: &str = "altitude_m";

/// Leser en strøm fra CSV med header. `time_s`, `speed_kmh` og `bpm` er
/// påkrevd; `altitude_m` er valgfri. Tomme celler blir hull.
pub fn read_stream_csv<P: AsRef<Path>>(path: P) -> CoreResult<Stream> {
    let path = path.as_ref();
    let stream = read_stream_from_reader(File::open(path)?)?;
    log::info!("loaded {} samples from {}", stream.len(), path.display());
    Ok(stream)
}

pub fn read_stream_from_reader<R: Read>(reader: R) -> CoreResult<Stream> {
    let mut rdr = csv::ReaderBuilder::new().trim(csv::Trim::All).from_reader(reader);
    let headers = rdr.headers()?.clone();
    let column = |name: &str| headers.iter().position(|h| h == name);
    let required =
        |name: &str| column(name).ok_or_else(|| CoreError::MissingColumn(name.to_string()));

    let i_time = required(COL_TIME)?;
    let i_speed = required(COL_SPEED)?;
    let i_bpm = required(COL_BPM)?;
    let i_alt = column(COL_ALTITUDE);

    let mut samples = Vec::new();
    for (row, rec) in rdr.records().enumerate() {
        let rec = rec?;
        // rad 1 er headeren
        let line = row + 2;
        let time_s = parse_cell(rec.get(i_time), line, COL_TIME)?
            .ok_or_else(|| CoreError::MalformedValue {
                row: line,
                column: COL_TIME.into(),
                value: String::new(),
            })?;
        samples.push(Sample {
            time_s,
            speed_kmh: parse_cell(rec.get(i_speed), line, COL_SPEED)?,
            bpm: parse_cell(rec.get(i_bpm), line, COL_BPM)?,
            altitude_m: match i_alt {
                Some(i) => parse_cell(rec.get(i), line, COL_ALTITUDE)?,
                None => None,
            },
        });
    }
    Stream::new(samples)
}

fn parse_cell(cell: Option<&str>, row: usize, column: &str) -> CoreResult<Option<f64>> {
    match cell.map(str::trim) {
        None | Some("") => Ok(None),
        Some(s) if s.eq_ignore_ascii_case("nan") => Ok(None),
        Some(s) => s.parse::<f64>().map(Some).map_err(|_| CoreError::MalformedValue {
            row,
            column: column.to_string(),
            value: s.to_string(),
        }),
    }
}

/// Skriver strømmen som CSV. Hull blir tomme celler.
pub fn write_stream_csv<P: AsRef<Path>>(stream: &Stream, path: P) -> CoreResult<()> {
    let path = path.as_ref();
    write_stream_to_writer(stream, File::create(path)?)?;
    log::info!("wrote {} samples to {}", stream.len(), path.display());
    Ok(())
}

pub fn write_stream_to_writer<W: Write>(stream: &Stream, writer: W) -> CoreResult<()> {
    let with_alt = stream.has_altitude();
    let mut wtr = csv::Writer::from_writer(writer);
    if with_alt {
        wtr.write_record([COL_TIME, COL_SPEED, COL_BPM, COL_ALTITUDE])?;
    } else {
        wtr.write_record([COL_TIME, COL_SPEED, COL_BPM])?;
    }
    let cell = |v: Option<f64>| v.map(|x| x.to_string()).unwrap_or_default();
    for s in stream.samples() {
        let mut rec = vec![s.time_s.to_string(), cell(s.speed_kmh), cell(s.bpm)];
        if with_alt {
            rec.push(cell(s.altitude_m));
        }
        wtr.write_record(&rec)?;
    }
    wtr.flush()?;
    Ok(())
}

/// Leser analyseoppsett fra disk (JSON).
/// Hvis filen ikke finnes, returneres standardoppsettet.
pub fn load_config<P: AsRef<Path>>(path: P) -> CoreResult<AnalysisConfig> {
    let path = path.as_ref();
    if !path.exists() {
        log::warn!("config not found at {}, using defaults", path.display());
        return Ok(AnalysisConfig::default());
    }
    let contents = std::fs::read_to_string(path)?;
    let cfg = AnalysisConfig::from_json_str(&contents)?;
    log::info!("config loaded from {} ({} scales)", path.display(), cfg.scales.len());
    Ok(cfg)
}

/// Lagrer analyseoppsett som JSON (pretty-print).
pub fn save_config<P: AsRef<Path>>(cfg: &AnalysisConfig, path: P) -> CoreResult<()> {
    let path = path.as_ref();
    let json = serde_json::to_string_pretty(cfg).map_err(|e| CoreError::Json(e.to_string()))?;
    std::fs::write(path, json)?;
    log::info!("config saved to {}", path.display());
    Ok(())
}

/// Metadatafil ved siden av en lagret strøm: `okt.csv` => `okt.meta.json`.
pub fn meta_path_for<P: AsRef<Path>>(stream_path: P) -> PathBuf {
    stream_path.as_ref().with_extension("meta.json")
}

pub fn save_meta<P: AsRef<Path>>(meta: &SessionMeta, path: P) -> CoreResult<()> {
    let path = path.as_ref();
    let json = serde_json::to_string_pretty(meta).map_err(|e| CoreError::Json(e.to_string()))?;
    std::fs::write(path, json)?;
    log::info!("meta saved to {}", path.display());
    Ok(())
}

/// Leser metadata. I motsetning til oppsettet er en manglende fil en feil.
pub fn load_meta<P: AsRef<Path>>(path: P) -> CoreResult<SessionMeta> {
    let contents = std::fs::read_to_string(path.as_ref())?;
    let de = &mut serde_json::Deserializer::from_str(&contents);
    serde_path_to_error::deserialize(de).map_err(CoreError::from_json_path)
}
