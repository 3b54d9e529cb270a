use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tract_onnx::prelude::*;
use tract_onnx::WithOnnx;
use tracing::{debug, info};

use super::array_utils::{create_input_tensor, EncodedInput, TokenScores};
use super::errors::DetectionError;

pub type TractRunnableModel =
    RunnableModel<TypedFact, Box<dyn TypedOp>, Graph<TypedFact, Box<dyn TypedOp>>>;

/// Per-token classification consumed by the typo detector.
///
/// Returns `[1, seq_len, labels]` scores where `seq_len` matches the encoded
/// input, sentinel positions included.
#[cfg_attr(test, mockall::automock)]
pub trait TokenClassifier {
    fn classify(&self, input: &EncodedInput) -> Result<TokenScores, DetectionError>;
}

/// How the exported model is turned into a runnable plan
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InferenceMode {
    /// Load the ONNX graph and optimize it for dynamic sequence lengths in one step
    #[default]
    Optimized,
    /// Pin a static shape, convert to an NNEF archive, reload and compile that
    Compiled,
}

impl FromStr for InferenceMode {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.to_ascii_lowercase().as_str() {
            "optimized" => Ok(Self::Optimized),
            "compiled" => Ok(Self::Compiled),
            other => Err(format!("unknown inference mode '{}' (expected optimized or compiled)", other)),
        }
    }
}

impl fmt::Display for InferenceMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Optimized => write!(f, "optimized"),
            Self::Compiled => write!(f, "compiled"),
        }
    }
}

/// Owns the compiled token-classification plan and runs it
pub struct OnnxModelManager {
    model_path: PathBuf,
    plan: TractRunnableModel,
    input_names: Vec<String>,
    // Some(len) when the plan was compiled for a static [1, len] shape
    static_length: Option<usize>,
}

impl fmt::Debug for OnnxModelManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OnnxModelManager")
            .field("model_path", &self.model_path)
            .field("input_names", &self.input_names)
            .field("static_length", &self.static_length)
            .finish()
    }
}

impl OnnxModelManager {
    /// Load using the requested inference path
    pub fn load(
        model_dir: &Path,
        mode: InferenceMode,
        max_sequence_length: usize,
        ir_cache_dir: Option<&Path>,
    ) -> Result<Self, DetectionError> {
        match mode {
            InferenceMode::Optimized => Self::load_optimized(model_dir),
            InferenceMode::Compiled => {
                let ir_dir = ir_cache_dir
                    .map(Path::to_path_buf)
                    .unwrap_or_else(|| model_dir.join("ir"));
                Self::load_compiled(model_dir, max_sequence_length, &ir_dir)
            }
        }
    }

    /// Load the ONNX graph and let the runtime optimize it directly
    pub fn load_optimized(model_dir: &Path) -> Result<Self, DetectionError> {
        let onnx_path = Self::find_onnx_model(model_dir)?;
        info!("🧠 Loading ONNX model from: {}", onnx_path.display());

        let load_failed = |e: TractError| DetectionError::ModelLoadFailed {
            path: onnx_path.display().to_string(),
            details: format!("{:#}", e),
        };

        let plan = tract_onnx::onnx()
            .model_for_path(&onnx_path)
            .and_then(|model| model.into_optimized())
            .and_then(|model| model.into_runnable())
            .map_err(load_failed)?;

        info!("✅ ONNX model optimized and ready!");
        Self::from_plan(onnx_path, plan, None)
    }

    /// Export to a static-shape NNEF archive (cached), reload and compile it
    pub fn load_compiled(
        model_dir: &Path,
        max_sequence_length: usize,
        ir_dir: &Path,
    ) -> Result<Self, DetectionError> {
        let onnx_path = Self::find_onnx_model(model_dir)?;
        let ir_path = Self::convert_to_ir(&onnx_path, max_sequence_length, ir_dir)?;
        Self::load_ir(&ir_path, onnx_path, max_sequence_length)
    }

    /// Compile an NNEF archive whose inputs are pinned to `[1, static_length]`
    fn load_ir(
        ir_path: &Path,
        model_path: PathBuf,
        static_length: usize,
    ) -> Result<Self, DetectionError> {
        info!("🔨 Compiling intermediate representation: {}", ir_path.display());
        let plan = tract_nnef::nnef()
            .with_tract_core()
            .with_onnx()
            .model_for_path(ir_path)
            .and_then(|model| model.into_optimized())
            .and_then(|model| model.into_runnable())
            .map_err(|e| DetectionError::ModelLoadFailed {
                path: ir_path.display().to_string(),
                details: format!("{:#}", e),
            })?;

        info!("✅ Compiled model ready for [1, {}] inputs", static_length);
        Self::from_plan(model_path, plan, Some(static_length))
    }

    /// Pin every input to `[1, max_sequence_length]` i64 and write the typed
    /// graph as an NNEF archive. An archive newer than the ONNX file is reused.
    pub fn convert_to_ir(
        onnx_path: &Path,
        max_sequence_length: usize,
        ir_dir: &Path,
    ) -> Result<PathBuf, DetectionError> {
        let stem = onnx_path
            .file_stem()
            .map(|stem| stem.to_string_lossy().to_string())
            .unwrap_or_else(|| "model".to_string());
        let ir_path = ir_dir.join(format!("{}_{}.nnef.tar", stem, max_sequence_length));

        if Self::is_cache_fresh(onnx_path, &ir_path)? {
            info!("🚀 Using cached intermediate representation: {}", ir_path.display());
            return Ok(ir_path);
        }

        info!("📦 Converting {} to NNEF for [1, {}] inputs", onnx_path.display(), max_sequence_length);
        let conversion_failed = |e: TractError| DetectionError::ConversionFailed {
            path: onnx_path.display().to_string(),
            details: format!("{:#}", e),
        };

        let mut model = tract_onnx::onnx()
            .model_for_path(onnx_path)
            .map_err(conversion_failed)?;
        let inputs = model.input_outlets().map_err(conversion_failed)?.len();
        for ix in 0..inputs {
            model
                .set_input_fact(ix, i64::fact([1, max_sequence_length]).into())
                .map_err(conversion_failed)?;
        }
        let typed = model
            .into_typed()
            .and_then(|model| model.into_decluttered())
            .map_err(conversion_failed)?;

        fs::create_dir_all(ir_dir)?;
        let file = fs::File::create(&ir_path)?;
        tract_nnef::nnef()
            .with_tract_core()
            .with_onnx()
            .write_to_tar(&typed, file)
            .map_err(conversion_failed)?;

        info!("✅ Intermediate representation written to: {}", ir_path.display());
        Ok(ir_path)
    }

    fn is_cache_fresh(source: &Path, cached: &Path) -> Result<bool, DetectionError> {
        if !cached.exists() {
            return Ok(false);
        }
        let source_modified = fs::metadata(source)?.modified()?;
        let cached_modified = fs::metadata(cached)?.modified()?;
        Ok(cached_modified >= source_modified)
    }

    fn from_plan(
        model_path: PathBuf,
        plan: TractRunnableModel,
        static_length: Option<usize>,
    ) -> Result<Self, DetectionError> {
        let model = plan.model();
        let input_names = model
            .input_outlets()
            .map_err(|e| DetectionError::ModelLoadFailed {
                path: model_path.display().to_string(),
                details: format!("{:#}", e),
            })?
            .iter()
            .map(|outlet| model.node(outlet.node).name.clone())
            .collect::<Vec<_>>();
        debug!("Model inputs: {:?}", input_names);

        Ok(Self {
            model_path,
            plan,
            input_names,
            static_length,
        })
    }

    /// Locate `model.onnx`, falling back to the first `.onnx` file in the directory
    pub fn find_onnx_model(model_dir: &Path) -> Result<PathBuf, DetectionError> {
        if model_dir.is_file() {
            return Ok(model_dir.to_path_buf());
        }

        let preferred = model_dir.join("model.onnx");
        if preferred.exists() {
            return Ok(preferred);
        }

        if model_dir.is_dir() {
            let mut candidates = fs::read_dir(model_dir)?
                .filter_map(|entry| entry.ok().map(|entry| entry.path()))
                .filter(|path| path.extension().is_some_and(|ext| ext == "onnx"))
                .collect::<Vec<_>>();
            candidates.sort();
            if let Some(first) = candidates.into_iter().next() {
                return Ok(first);
            }
        }

        Err(DetectionError::ModelNotFound {
            path: preferred.display().to_string(),
        })
    }
}

impl TokenClassifier for OnnxModelManager {
    fn classify(&self, input: &EncodedInput) -> Result<TokenScores, DetectionError> {
        let actual_length = input.len();
        let feed = match self.static_length {
            Some(length) => input.padded_to(length)?,
            None => input.clone(),
        };

        let mut tensors: TVec<TValue> = tvec!();
        for name in &self.input_names {
            tensors.push(create_input_tensor(feed.row_for(name))?.into());
        }

        debug!("🤖 Running inference on {} positions", feed.len());
        let outputs = self
            .plan
            .run(tensors)
            .map_err(|e| DetectionError::InferenceFailed {
                details: format!("{:#}", e),
            })?;
        let logits = outputs.first().ok_or_else(|| DetectionError::InferenceFailed {
            details: "model produced no outputs".to_string(),
        })?;

        let scores = TokenScores::from_tensor(logits)?;
        Ok(match self.static_length {
            Some(_) => scores.truncated(actual_length),
            None => scores,
        })
    }
}
