//! Anchor-based shader source injection.
//!
//! A [`ShaderAugmentation`] names a stage, an anchor substring expected in
//! that stage's generated source, and a snippet to splice in right after the
//! anchor. Anchors are kept in place so later augmentations (or a second
//! patch run) can still find them.

use std::fmt;

use crate::scene::MaterialId;

/// Pipeline stage a source belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ShaderStage {
    /// Vertex shader.
    Vertex,
    /// Fragment shader.
    Fragment,
}

impl fmt::Display for ShaderStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Vertex => f.write_str("vertex"),
            Self::Fragment => f.write_str("fragment"),
        }
    }
}

/// Vertex and fragment source of one material program.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShaderSources {
    /// Vertex stage WGSL.
    pub vertex: String,
    /// Fragment stage WGSL.
    pub fragment: String,
}

impl ShaderSources {
    /// Source of one stage.
    #[must_use]
    pub fn stage(&self, stage: ShaderStage) -> &str {
        match stage {
            ShaderStage::Vertex => &self.vertex,
            ShaderStage::Fragment => &self.fragment,
        }
    }

    fn stage_mut(&mut self, stage: ShaderStage) -> &mut String {
        match stage {
            ShaderStage::Vertex => &mut self.vertex,
            ShaderStage::Fragment => &mut self.fragment,
        }
    }
}

/// A snippet to insert right after an anchor substring.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShaderAugmentation {
    /// Stage whose source is patched.
    pub stage: ShaderStage,
    /// Exact substring marking the insertion point.
    pub anchor: &'static str,
    /// Code inserted immediately after the anchor.
    pub injected_source: &'static str,
}

/// An augmentation could not be applied.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ShaderPatchError {
    /// The stage source does not contain the anchor.
    AnchorNotFound {
        /// Stage that was searched.
        stage: ShaderStage,
        /// Anchor that was missing.
        anchor: &'static str,
    },
    /// A patch was registered for a material the scene does not hold.
    UnknownMaterial(MaterialId),
}

impl fmt::Display for ShaderPatchError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::AnchorNotFound { stage, anchor } => {
                write!(f, "anchor `{anchor}` not found in {stage} shader")
            }
            Self::UnknownMaterial(id) => {
                write!(f, "no material with id {} to patch", id.0)
            }
        }
    }
}

impl std::error::Error for ShaderPatchError {}

/// Insert `augmentation.injected_source` after the first occurrence of its
/// anchor in `source`.
pub fn inject(
    source: &str,
    augmentation: &ShaderAugmentation,
) -> Result<String, ShaderPatchError> {
    let Some(at) = source.find(augmentation.anchor) else {
        return Err(ShaderPatchError::AnchorNotFound {
            stage: augmentation.stage,
            anchor: augmentation.anchor,
        });
    };
    let split = at + augmentation.anchor.len();
    let mut patched =
        String::with_capacity(source.len() + augmentation.injected_source.len());
    patched.push_str(&source[..split]);
    patched.push_str(augmentation.injected_source);
    patched.push_str(&source[split..]);
    Ok(patched)
}

/// Apply augmentations in order.
///
/// Each stage is patched all-or-nothing: if any anchor for a stage is
/// missing, that stage is left byte-identical, the other stage is still
/// patched, and the first missing anchor is reported.
pub fn apply_augmentations(
    sources: &ShaderSources,
    augmentations: &[ShaderAugmentation],
) -> (ShaderSources, Result<(), ShaderPatchError>) {
    let mut patched = sources.clone();
    let mut first_error = None;

    for stage in [ShaderStage::Vertex, ShaderStage::Fragment] {
        let mut text = sources.stage(stage).to_owned();
        let mut failed = false;
        for aug in augmentations.iter().filter(|a| a.stage == stage) {
            match inject(&text, aug) {
                Ok(next) => text = next,
                Err(e) => {
                    log::error!("{e}; leaving {stage} shader unpatched");
                    let _ = first_error.get_or_insert(e);
                    failed = true;
                    break;
                }
            }
        }
        if !failed {
            *patched.stage_mut(stage) = text;
        }
    }

    let status = first_error.map_or(Ok(()), Err);
    (patched, status)
}

#[cfg(test)]
mod tests {
    use super::*;

    const PARS: &str = "// pars-anchor";
    const MAIN: &str = "// main-anchor";

    fn aug(stage: ShaderStage, anchor: &'static str, code: &'static str) -> ShaderAugmentation {
        ShaderAugmentation {
            stage,
            anchor,
            injected_source: code,
        }
    }

    fn sources() -> ShaderSources {
        ShaderSources {
            vertex: format!("top\n{PARS}\nfn main() {{\n{MAIN}\n}}\n"),
            fragment: format!("{PARS}\nfn fs() {{\n{MAIN}\n}}\n"),
        }
    }

    #[test]
    fn inject_appends_after_anchor_and_keeps_it() {
        let out = inject(
            "a ANCHOR b",
            &aug(ShaderStage::Vertex, "ANCHOR", "+x"),
        )
        .unwrap();
        assert_eq!(out, "a ANCHOR+x b");
    }

    #[test]
    fn inject_only_touches_first_occurrence() {
        let out =
            inject("A A", &aug(ShaderStage::Vertex, "A", "1")).unwrap();
        assert_eq!(out, "A1 A");
    }

    #[test]
    fn pars_then_main_grows_by_exact_snippet_lengths() {
        let src = sources();
        let pars = "\nlet decl = 1;";
        let main = "\nuse_decl(decl);";
        let augs = [
            aug(ShaderStage::Vertex, PARS, pars),
            aug(ShaderStage::Vertex, MAIN, main),
        ];
        let (patched, status) = apply_augmentations(&src, &augs);
        status.unwrap();
        assert_eq!(
            patched.vertex.len(),
            src.vertex.len() + pars.len() + main.len()
        );
        assert!(patched.vertex.contains(PARS));
        assert!(patched.vertex.contains(MAIN));
        // Declaration precedes its use
        let decl = patched.vertex.find("let decl").unwrap();
        let usage = patched.vertex.find("use_decl").unwrap();
        assert!(decl < usage);
        // Untargeted stage untouched
        assert_eq!(patched.fragment, src.fragment);
    }

    #[test]
    fn missing_anchor_leaves_stage_byte_identical() {
        let src = sources();
        let augs = [
            aug(ShaderStage::Fragment, PARS, "\nfn helper() {}"),
            aug(ShaderStage::Fragment, "// renamed-anchor", "\nhelper();"),
            aug(ShaderStage::Vertex, PARS, "\nlet v = 0;"),
        ];
        let (patched, status) = apply_augmentations(&src, &augs);
        assert_eq!(
            status,
            Err(ShaderPatchError::AnchorNotFound {
                stage: ShaderStage::Fragment,
                anchor: "// renamed-anchor",
            })
        );
        // No partial patch of the fragment stage
        assert_eq!(patched.fragment, src.fragment);
        // The healthy stage is still patched
        assert!(patched.vertex.contains("let v = 0;"));
    }

    #[test]
    fn error_message_names_stage_and_anchor() {
        let err = inject("", &aug(ShaderStage::Fragment, "X", "")).unwrap_err();
        assert_eq!(err.to_string(), "anchor `X` not found in fragment shader");
    }
}
