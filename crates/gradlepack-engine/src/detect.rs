//! Detection: does this buildpack apply to the application, and what does
//! it need from the rest of the build?

use std::path::{Path, PathBuf};

use gradlepack_config::resolver::{BUILD_FILE, INSTALL_NODE, NODE_PROJECT_PATH};
use gradlepack_config::ConfigurationResolver;
use tracing::{debug, info};

use crate::error::EngineError;
use crate::plan::{
    BuildPlan, DetectResult, Provide, Require, GRADLE, JDK, JVM_APPLICATION_PACKAGE, NODE, SYFT,
    YARN,
};

/// Marker files probed in priority order when no override is configured.
pub const MARKER_FILES: [&str; 4] = [
    "build.gradle",
    "build.gradle.kts",
    "settings.gradle",
    "settings.gradle.kts",
];

/// Decide whether `application` is a Gradle project.
///
/// A configured build-file override that does not exist fails detection even
/// when default marker files are present.
///
/// # Errors
/// Returns an error if a candidate file cannot be stat'ed for a reason other
/// than absence, or the JS toolchain flag is not a valid boolean.
pub fn detect(application: &Path, config: &ConfigurationResolver) -> Result<DetectResult, EngineError> {
    let candidates: Vec<PathBuf> = match config.resolve(BUILD_FILE) {
        Some(build_file) => vec![application.join(build_file)],
        None => MARKER_FILES.iter().map(|f| application.join(f)).collect(),
    };

    let mut matched = None;
    for candidate in &candidates {
        if gradlepack_util::fs::exists(candidate)? {
            matched = Some(candidate);
            break;
        }
    }
    let Some(marker) = matched else {
        debug!(application = %application.display(), "no gradle build file found");
        return Ok(DetectResult::fail());
    };
    debug!(marker = %marker.display(), "detected gradle project");

    let mut plan = BuildPlan {
        provides: vec![
            Provide {
                name: GRADLE.to_owned(),
            },
            Provide {
                name: JVM_APPLICATION_PACKAGE.to_owned(),
            },
        ],
        requires: vec![Require::new(SYFT), Require::new(GRADLE), Require::new(JDK)],
    };

    if config.resolve_bool(INSTALL_NODE)? {
        require_js_toolchain(application, config, &mut plan)?;
    }

    Ok(DetectResult {
        pass: true,
        plans: vec![plan],
    })
}

fn require_js_toolchain(
    application: &Path,
    config: &ConfigurationResolver,
    plan: &mut BuildPlan,
) -> Result<(), EngineError> {
    let project = match config.resolve(NODE_PROJECT_PATH) {
        Some(sub_path) => application.join(sub_path),
        None => application.to_path_buf(),
    };

    if gradlepack_util::fs::exists(&project.join("yarn.lock"))? {
        plan.require(Require::build_only(YARN));
        plan.require(Require::build_only(NODE));
    } else if gradlepack_util::fs::exists(&project.join("package.json"))? {
        plan.require(Require::build_only(NODE));
    } else {
        info!(
            path = %project.display(),
            "no yarn.lock or package.json found, skipping JS toolchain requirements"
        );
    }
    Ok(())
}
