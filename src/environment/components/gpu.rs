//! NVIDIA GPU hardware detection and minimum-requirement policy.
//!
//! Classification works on the marketing name only. Tool output is not
//! structured, so every rule is a substring or pattern match on the
//! upper-cased name.

use regex::Regex;
use std::sync::LazyLock;
use std::time::Duration;
use tracing::{debug, info};

use crate::environment::component::{log_result, log_start, verify_only, Component};
use crate::environment::types::{failure_codes, ComponentResult, EnvironmentComponent};
use crate::shell::{CommandExecutor, ExecTarget};

const NVIDIA_SMI_NAMES: &str = "nvidia-smi --query-gpu=name --format=csv,noheader";
const VIDEO_CONTROLLER_NAMES: &str =
    "Get-CimInstance Win32_VideoController | Select-Object -ExpandProperty Name";

const QUERY_TIMEOUT: Duration = Duration::from_secs(30);

/// Professional and datacenter parts that always qualify.
const HIGH_END_CARDS: &[&str] = &[
    "TESLA",
    "QUADRO RTX",
    "RTX A",
    "A100",
    "H100",
    "A40",
    "A30",
    "A10",
    "V100",
    "P100",
];

const BLACKWELL_MARKERS: &[&str] = &["BLACKWELL", "GB200", "B200", "B100"];

/// `RTX <series><model>[ TI|SUPER]`, e.g. `RTX 3060 Ti` gives 30 / 60 / TI.
static RTX_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)RTX\s*(\d+)(\d{2,3})(?:\s*(TI|SUPER))?").expect("RTX_PATTERN must compile")
});

/// Parsed consumer RTX model.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RtxModel {
    pub series: u32,
    pub model: u32,
    pub suffix: Option<String>,
}

/// Parse the RTX series and model out of a GPU name.
pub fn parse_rtx_model(name: &str) -> Option<RtxModel> {
    let upper = name.to_uppercase();
    let caps = RTX_PATTERN.captures(&upper)?;
    Some(RtxModel {
        series: caps.get(1)?.as_str().parse().ok()?,
        model: caps.get(2)?.as_str().parse().ok()?,
        suffix: caps.get(3).map(|m| m.as_str().to_string()),
    })
}

/// Whether a GPU name meets the minimum requirement. First matching rule
/// wins.
pub fn meets_minimum_requirement(name: &str) -> bool {
    let upper = name.to_uppercase();

    if let Some(card) = HIGH_END_CARDS.iter().find(|c| upper.contains(*c)) {
        debug!("GPU identified as high-end/professional card: {}", card);
        return true;
    }

    if upper.contains("GEFORCE") || upper.contains("RTX") {
        if let Some(rtx) = parse_rtx_model(&upper) {
            debug!(
                "GPU parsed - series {}, model {}, suffix {:?}",
                rtx.series, rtx.model, rtx.suffix
            );
            let is_ti = rtx.suffix.as_deref() == Some("TI");
            return match rtx.series {
                s if s >= 50 => true,
                40 => rtx.model >= 60,
                30 => rtx.model > 60 || (rtx.model == 60 && is_ti),
                _ => false,
            };
        }
    }

    // GTX parts never qualify; unknown names are rejected as well.
    false
}

/// Whether a GPU belongs to the Blackwell generation.
pub fn is_blackwell_series(name: &str) -> bool {
    let upper = name.to_uppercase();
    if BLACKWELL_MARKERS.iter().any(|m| upper.contains(m)) {
        return true;
    }
    parse_rtx_model(&upper).is_some_and(|rtx| rtx.series == 50)
}

/// Checks for a qualifying NVIDIA GPU.
pub struct NvidiaGpu<'a, E: CommandExecutor> {
    executor: &'a E,
}

impl<'a, E: CommandExecutor> NvidiaGpu<'a, E> {
    pub fn new(executor: &'a E) -> Self {
        Self { executor }
    }

    /// Names of installed NVIDIA GPUs. `nvidia-smi` first, the display
    /// adapter list when it is unavailable.
    fn gpu_names(&self) -> Vec<String> {
        let smi = self
            .executor
            .run(NVIDIA_SMI_NAMES, QUERY_TIMEOUT, ExecTarget::Host);
        let names = if smi.success() {
            non_empty_lines(&smi.stdout)
        } else {
            Vec::new()
        };
        if !names.is_empty() {
            return names;
        }

        let adapters = self
            .executor
            .run(VIDEO_CONTROLLER_NAMES, QUERY_TIMEOUT, ExecTarget::Host);
        if !adapters.success() {
            return Vec::new();
        }
        non_empty_lines(&adapters.stdout)
            .into_iter()
            .filter(|n| n.to_uppercase().contains("NVIDIA"))
            .collect()
    }
}

fn non_empty_lines(text: &str) -> Vec<String> {
    text.lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .map(String::from)
        .collect()
}

impl<E: CommandExecutor> Component for NvidiaGpu<'_, E> {
    fn kind(&self) -> EnvironmentComponent {
        EnvironmentComponent::NvidiaGpu
    }

    fn check(&self) -> ComponentResult {
        log_start(self.kind(), "Checking");

        let names = self.gpu_names();
        let result = if names.is_empty() {
            ComponentResult::failed(
                self.kind(),
                "No NVIDIA GPU detected",
                failure_codes::NO_NVIDIA_GPU,
            )
        } else {
            info!("[ENV] Found NVIDIA GPU(s): {}", names.join(", "));
            match names.iter().find(|n| meets_minimum_requirement(n)) {
                Some(name) => {
                    let image = if is_blackwell_series(name) {
                        "Blackwell series - will use blackwell image"
                    } else {
                        "will use hopper image"
                    };
                    ComponentResult::success(
                        self.kind(),
                        format!("Compatible NVIDIA GPU detected: {} ({})", name, image),
                    )
                }
                None => ComponentResult::failed(
                    self.kind(),
                    format!("GPU below minimum requirement: {}", names[0]),
                    failure_codes::GPU_BELOW_MINIMUM,
                ),
            }
        };

        log_result("Checking", &result);
        result
    }

    fn install(&self) -> ComponentResult {
        verify_only(self.check())
    }
}
