//! The end-to-end release workflow.
//!
//! Steps run strictly in order and the first failure ends the run. Earlier
//! side effects (a rewritten manifest, a pushed commit or tag) are left in
//! place for the operator to deal with.

use crate::config::{ReleaseConfig, VersionSourceKind};
use crate::error::ReleaseError;
use crate::git::SourceControl;
use crate::parsers::{ManifestVersionSource, TagVersionSource, VersionSource};
use crate::publisher::ReleasePublisher;
use crate::test_runner::TestRunner;
use crate::version::{bump, tag_name};
use log::info;
use semver::Version;
use std::fmt;
use thiserror::Error;

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum ReleaseStage {
    Init,
    VersionResolved,
    DryRunStop,
    TestsRun,
    ManifestUpdated,
    Committed,
    Tagged,
    Published,
    Done,
}

impl fmt::Display for ReleaseStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ReleaseStage::Init => "init",
            ReleaseStage::VersionResolved => "version resolution",
            ReleaseStage::DryRunStop => "dry run",
            ReleaseStage::TestsRun => "tests",
            ReleaseStage::ManifestUpdated => "manifest update",
            ReleaseStage::Committed => "commit and push",
            ReleaseStage::Tagged => "tag and push",
            ReleaseStage::Published => "GitHub release",
            ReleaseStage::Done => "done",
        })
    }
}

/// A failed run, tagged with the step that was being attempted
#[derive(Debug, Error)]
#[error("release failed during {stage}")]
pub struct StageError {
    pub stage: ReleaseStage,
    #[source]
    pub source: ReleaseError,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReleaseOutcome {
    pub current: Version,
    pub next: Version,
    /// The terminal stage reached
    pub stage: ReleaseStage,
}

fn at(stage: ReleaseStage) -> impl FnOnce(ReleaseError) -> StageError {
    move |source| StageError { stage, source }
}

pub struct ReleaseOrchestrator<'a, S: SourceControl + ?Sized> {
    config: &'a ReleaseConfig,
    scm: &'a S,
    test_runner: TestRunner,
    publisher: ReleasePublisher,
}

impl<'a, S: SourceControl + ?Sized> ReleaseOrchestrator<'a, S> {
    pub fn new(config: &'a ReleaseConfig, scm: &'a S, test_runner: TestRunner, publisher: ReleasePublisher) -> Self {
        Self { config, scm, test_runner, publisher }
    }

    fn version_source(&self) -> Result<Box<dyn VersionSource + '_>, ReleaseError> {
        let source: Box<dyn VersionSource + '_> = match self.config.project.version_source {
            VersionSourceKind::Manifest => Box::new(ManifestVersionSource::new(&self.config.project.manifest_path)?),
            VersionSourceKind::Tags => Box::new(TagVersionSource::new(self.scm)),
        };
        Ok(source)
    }

    pub async fn run(&self) -> Result<ReleaseOutcome, StageError> {
        let run = &self.config.run;
        let project = &self.config.project;

        let current = self
            .version_source()
            .and_then(|source| source.current_version())
            .map_err(at(ReleaseStage::VersionResolved))?;
        let next = bump(&current, run.bump).map_err(at(ReleaseStage::VersionResolved))?;
        info!("Current version: {}", current);
        info!("Target version: {}", next);
        let outcome = |stage| ReleaseOutcome { current: current.clone(), next: next.clone(), stage };

        if run.dry_run {
            info!("Dry run completed. No changes made.");
            return Ok(outcome(ReleaseStage::DryRunStop));
        }

        if run.skip_tests {
            info!("Skipping tests as requested");
        } else {
            self.test_runner.run().await.map_err(at(ReleaseStage::TestsRun))?;
        }

        match project.version_source {
            VersionSourceKind::Manifest => {
                let updated = ManifestVersionSource::new(&project.manifest_path)
                    .and_then(|manifest| manifest.update_version(&next))
                    .map_err(at(ReleaseStage::ManifestUpdated))?;
                if updated {
                    info!("Updated {} with version {}", project.manifest_path.display(), next);
                }
            }
            VersionSourceKind::Tags => info!("Versions are tracked by tags, manifest left as is"),
        }

        self.commit_and_push(&next).map_err(at(ReleaseStage::Committed))?;

        if run.skip_publish {
            info!("Skipping tag and GitHub release as requested");
            info!("Version update to {} completed successfully!", next);
            return Ok(outcome(ReleaseStage::Committed));
        }

        let tag = tag_name(&next);
        self.scm
            .create_annotated_tag(&tag, &format!("Version {next}"))
            .and_then(|_| self.scm.push_tag(&tag))
            .map_err(at(ReleaseStage::Tagged))?;
        info!("Version {} tagged and pushed", next);

        self.publisher.publish(self.scm, &next).await.map_err(at(ReleaseStage::Published))?;

        info!("Version update to {} completed successfully!", next);
        Ok(outcome(ReleaseStage::Done))
    }

    fn commit_and_push(&self, next: &Version) -> Result<(), ReleaseError> {
        match self.config.project.version_source {
            VersionSourceKind::Manifest => self.scm.stage(std::slice::from_ref(&self.config.project.manifest_path))?,
            VersionSourceKind::Tags => self.scm.stage_all()?,
        }
        self.scm.commit(&format!("Bump version to {next}"))?;
        let branch = self.scm.current_branch()?;
        self.scm.push_branch(&branch)
    }
}
