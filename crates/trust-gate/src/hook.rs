use std::fmt;

use crate::environment::{StackFrame, StackIntrospector};

pub const PROCESS_INIT_FRAME: &str = "com.android.internal.os.ZygoteInit";
pub const INSTRUMENTATION_NAMESPACES: [&str; 2] =
    ["com.saurik.substrate", "de.robv.android.xposed"];

/// Frame markers for the hook detector. The defaults name managed-runtime
/// classes; hosts capturing native stacks supply their own.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HookRules {
    pub process_init_frame: String,
    pub instrumentation_namespaces: Vec<String>,
}

impl Default for HookRules {
    fn default() -> Self {
        Self {
            process_init_frame: PROCESS_INIT_FRAME.to_string(),
            instrumentation_namespaces: INSTRUMENTATION_NAMESPACES
                .iter()
                .map(|ns| (*ns).to_string())
                .collect(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HookSignal {
    ProcessInitReentered { occurrences: usize },
    InstrumentationFrame { symbol: String },
}

impl HookSignal {
    pub fn code(&self) -> &'static str {
        match self {
            Self::ProcessInitReentered { .. } => "process_init_reentered",
            Self::InstrumentationFrame { .. } => "instrumentation_frame",
        }
    }
}

impl fmt::Display for HookSignal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ProcessInitReentered { occurrences } => {
                write!(f, "process init entry seen {} times on one stack", occurrences)
            }
            Self::InstrumentationFrame { symbol } => {
                write!(f, "instrumentation frame on stack: {}", symbol)
            }
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HookObservation {
    pub signals: Vec<HookSignal>,
}

impl HookObservation {
    pub fn detected(&self) -> bool {
        !self.signals.is_empty()
    }
}

/// Captures the current stack and inspects it. A failed capture is
/// treated as nothing detected.
pub fn detect_hooks(stack: &dyn StackIntrospector, rules: &HookRules) -> HookObservation {
    match stack.capture() {
        Ok(frames) => inspect_frames(&frames, rules),
        Err(err) => {
            tracing::trace!(error = %err, "stack capture inconclusive");
            HookObservation::default()
        }
    }
}

pub fn inspect_frames(frames: &[StackFrame], rules: &HookRules) -> HookObservation {
    let mut signals = Vec::new();
    let mut init_occurrences = 0usize;

    for frame in frames {
        if !rules.process_init_frame.is_empty() && frame.symbol.contains(&rules.process_init_frame)
        {
            init_occurrences += 1;
        }
        if rules
            .instrumentation_namespaces
            .iter()
            .any(|ns| !ns.is_empty() && frame.symbol.contains(ns.as_str()))
        {
            signals.push(HookSignal::InstrumentationFrame {
                symbol: frame.symbol.clone(),
            });
        }
    }

    // An unmodified runtime enters process init exactly once.
    if init_occurrences > 1 {
        signals.insert(
            0,
            HookSignal::ProcessInitReentered {
                occurrences: init_occurrences,
            },
        );
    }

    HookObservation { signals }
}
