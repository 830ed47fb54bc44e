//! On-disk demonstration format.
//!
//! One JSON document per demonstration:
//! - `tensors`: flat numeric columns keyed `obs_*` (one per observation
//!   field), `info_*` (one per info field, always including
//!   `info_demo_action` holding the executed actions as f64) and `reward`.
//!   Each column stores its shape, with the step count as the leading axis.
//! - `termination` / `truncation`: per-step boolean arrays.
//! - `metadata`: the [`Metadata`] block, each field individually
//!   JSON-encoded so it is decodable without interpreting the tensors.
//!
//! Booleans round-trip bit-for-bit; floats round-trip within f64
//! re-encoding tolerance.

use std::collections::BTreeMap;
use std::fs;
use std::io::{BufReader, BufWriter};
use std::path::{Path, PathBuf};

use ndarray::Array1;
use serde::{Deserialize, Serialize};

use super::metadata::Metadata;
use super::types::{DemoStep, ObservationMode, ACTION_KEY};
use super::Demo;
use crate::env::{Info, Observation};
use crate::error::DemoFileError;

/// File extension of persisted demonstrations.
pub const DEMO_SUFFIX: &str = "json";

const OBSERVATION_PREFIX: &str = "obs_";
const INFO_PREFIX: &str = "info_";
const REWARD_KEY: &str = "reward";

/// One named numeric column; leading axis is the step count.
#[derive(Debug, Serialize, Deserialize)]
struct TensorColumn {
    shape: Vec<usize>,
    data: Vec<f64>,
}

impl TensorColumn {
    fn from_rows(rows: Vec<&Array1<f64>>) -> Result<Self, DemoFileError> {
        let dim = rows.first().map(|row| row.len()).unwrap_or(0);
        let mut data = Vec::with_capacity(rows.len() * dim);
        for row in &rows {
            if row.len() != dim {
                return Err(DemoFileError::RaggedObservations(format!(
                    "row of {} values where {} were expected",
                    row.len(),
                    dim
                )));
            }
            data.extend(row.iter().copied());
        }
        Ok(Self {
            shape: vec![rows.len(), dim],
            data,
        })
    }

    fn steps(&self) -> usize {
        self.shape.first().copied().unwrap_or(0)
    }

    /// Check the flat data against the declared shape. Loading never trusts
    /// a file's shape field without this.
    fn validate(&self, key: &str, rank: usize) -> Result<(), DemoFileError> {
        if self.shape.len() != rank {
            return Err(DemoFileError::CorruptColumn {
                key: key.to_string(),
                message: format!("shape has {} axes, expected {}", self.shape.len(), rank),
            });
        }
        let expected: usize = self.shape.iter().product();
        if self.data.len() != expected {
            return Err(DemoFileError::CorruptColumn {
                key: key.to_string(),
                message: format!("{} values where the shape declares {}", self.data.len(), expected),
            });
        }
        Ok(())
    }

    fn row(&self, index: usize) -> Array1<f64> {
        let dim = self.shape.get(1).copied().unwrap_or(0);
        Array1::from_iter(self.data[index * dim..(index + 1) * dim].iter().copied())
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct DemoDocument {
    tensors: BTreeMap<String, TensorColumn>,
    termination: Vec<bool>,
    truncation: Vec<bool>,
    metadata: BTreeMap<String, String>,
}

/// Force the demonstration file extension onto a path.
pub fn with_demo_suffix(path: &Path) -> PathBuf {
    if path.extension().and_then(|e| e.to_str()) == Some(DEMO_SUFFIX) {
        path.to_path_buf()
    } else {
        path.with_extension(DEMO_SUFFIX)
    }
}

/// Persist a demonstration, creating parent directories as needed.
pub(crate) fn write_demo(demo: &Demo, path: &Path) -> Result<PathBuf, DemoFileError> {
    let path = with_demo_suffix(path);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }

    let steps = demo.timesteps();
    let mut tensors = BTreeMap::new();

    tensors.insert(
        format!("{INFO_PREFIX}{ACTION_KEY}"),
        TensorColumn::from_rows(steps.iter().map(DemoStep::executed_action).collect())?,
    );

    if !demo.is_lightweight() {
        for key in column_keys(steps, |step| &step.observation)? {
            let rows = collect_rows(steps, |step| &step.observation, &key)?;
            tensors.insert(format!("{OBSERVATION_PREFIX}{key}"), TensorColumn::from_rows(rows)?);
        }
        for key in column_keys(steps, |step| &step.info)? {
            let rows = collect_rows(steps, |step| &step.info, &key)?;
            tensors.insert(format!("{INFO_PREFIX}{key}"), TensorColumn::from_rows(rows)?);
        }
        let rewards: Vec<f64> = steps.iter().map(|step| step.reward.unwrap_or(0.0)).collect();
        tensors.insert(
            REWARD_KEY.to_string(),
            TensorColumn {
                shape: vec![rewards.len()],
                data: rewards,
            },
        );
    }

    let document = DemoDocument {
        tensors,
        termination: steps.iter().map(|step| step.termination).collect(),
        truncation: steps.iter().map(|step| step.truncation).collect(),
        metadata: demo.metadata().encoded_fields()?,
    };

    let file = fs::File::create(&path)?;
    serde_json::to_writer(BufWriter::new(file), &document)?;
    tracing::debug!(path = %path.display(), steps = steps.len(), "saved demonstration");
    Ok(path)
}

/// Load a demonstration, optionally overriding its stored metadata.
pub(crate) fn read_demo(
    path: &Path,
    override_metadata: Option<Metadata>,
) -> Result<Demo, DemoFileError> {
    let path = with_demo_suffix(path);
    if !path.exists() {
        return Err(DemoFileError::FileNotFound(path.display().to_string()));
    }

    let file = fs::File::open(&path)?;
    let document: DemoDocument = serde_json::from_reader(BufReader::new(file))?;

    let metadata = match override_metadata {
        Some(metadata) => metadata,
        None => Metadata::from_encoded_fields(&document.metadata)?,
    };

    let action_key = format!("{INFO_PREFIX}{ACTION_KEY}");
    let actions = document
        .tensors
        .get(&action_key)
        .ok_or_else(|| DemoFileError::MissingKey(action_key.clone()))?;
    let len = actions.steps();

    for (key, column) in &document.tensors {
        if column.steps() != len {
            return Err(DemoFileError::LengthMismatch {
                key: key.clone(),
                expected: len,
                found: column.steps(),
            });
        }
        let rank = if key == REWARD_KEY { 1 } else { 2 };
        column.validate(key, rank)?;
    }
    for (key, flags) in [
        ("termination", &document.termination),
        ("truncation", &document.truncation),
    ] {
        if flags.len() != len {
            return Err(DemoFileError::LengthMismatch {
                key: key.to_string(),
                expected: len,
                found: flags.len(),
            });
        }
    }

    let rewards = document.tensors.get(REWARD_KEY);
    let lightweight = metadata.observation_mode == ObservationMode::Lightweight;

    let mut steps = Vec::with_capacity(len);
    for index in 0..len {
        let mut observation = Observation::new();
        let mut info = Info::new();
        if !lightweight {
            for (key, column) in &document.tensors {
                if let Some(name) = key.strip_prefix(OBSERVATION_PREFIX) {
                    observation.insert(name.to_string(), column.row(index));
                } else if let Some(name) = key.strip_prefix(INFO_PREFIX) {
                    if name != ACTION_KEY {
                        info.insert(name.to_string(), column.row(index));
                    }
                }
            }
        }
        let reward = if lightweight {
            None
        } else {
            rewards.map(|column| column.data[index])
        };
        steps.push(DemoStep::new(
            observation,
            reward,
            document.termination[index],
            document.truncation[index],
            info,
            actions.row(index),
        ));
    }

    Ok(Demo::new(metadata, steps))
}

fn column_keys<F>(steps: &[DemoStep], select: F) -> Result<Vec<String>, DemoFileError>
where
    F: Fn(&DemoStep) -> &BTreeMap<String, Array1<f64>>,
{
    let Some(first) = steps.first() else {
        return Ok(Vec::new());
    };
    let keys: Vec<String> = select(first).keys().cloned().collect();
    for step in steps {
        if select(step).len() != keys.len() {
            return Err(DemoFileError::RaggedObservations(
                "steps expose differing key sets".to_string(),
            ));
        }
    }
    Ok(keys)
}

fn collect_rows<'a, F>(
    steps: &'a [DemoStep],
    select: F,
    key: &str,
) -> Result<Vec<&'a Array1<f64>>, DemoFileError>
where
    F: Fn(&DemoStep) -> &BTreeMap<String, Array1<f64>>,
{
    steps
        .iter()
        .map(|step| {
            select(step)
                .get(key)
                .ok_or_else(|| DemoFileError::RaggedObservations(format!("key '{key}' missing")))
        })
        .collect()
}
