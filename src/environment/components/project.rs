//! Project checkout and virtual environment inside the subsystem.
//!
//! The project lives in `~/<name>` where `<name>` is taken from the
//! repository URL. A deployment is considered installed when the package
//! shows up in the checkout's `venv`; freshness is measured as the number
//! of commits between `HEAD` and the tracked remote branch.

use std::time::Duration;
use tracing::{info, warn};

use crate::environment::component::{log_result, log_start, Component};
use crate::environment::context::{ExecutionContext, CUDA_BIN_DIR};
use crate::environment::sequence::{stdout_sink, CommandSequence, OutputSink, SequenceStep};
use crate::environment::types::{
    failure_codes, ComponentResult, ComponentStatus, EnvironmentComponent,
};
use crate::shell::{quote_posix, CommandExecutor, CommandResult, ExecTarget};

const QUERY_TIMEOUT: Duration = Duration::from_secs(30);
const IMPORT_TIMEOUT: Duration = Duration::from_secs(60);
const FETCH_TIMEOUT: Duration = Duration::from_secs(60);
const PULL_TIMEOUT: Duration = Duration::from_secs(300);
const CLONE_TIMEOUT: Duration = Duration::from_secs(600);
const APT_TIMEOUT: Duration = Duration::from_secs(300);
const PACKAGE_TIMEOUT: Duration = Duration::from_secs(1800);

/// Toolkit binaries exported on `PATH` for interactive shells.

/// How an install run treats the checkout.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeployMode {
    /// A checkout exists: pull and reinstall the package.
    Update,
    /// No usable checkout: clone and bootstrap everything.
    Fresh,
}

/// Parse `git rev-list --count` output.
pub fn parse_commit_count(output: &str) -> Option<u32> {
    output.trim().parse().ok()
}

/// Deploys and updates the project.
pub struct ProjectDeployment<'a, E: CommandExecutor> {
    context: &'a ExecutionContext,
    executor: &'a E,
    output: OutputSink,
}

impl<'a, E: CommandExecutor> ProjectDeployment<'a, E> {
    pub fn new(context: &'a ExecutionContext, executor: &'a E) -> Self {
        Self {
            context,
            executor,
            output: stdout_sink(),
        }
    }

    /// Send relayed install output somewhere other than the terminal.
    pub fn with_output(mut self, output: OutputSink) -> Self {
        self.output = output;
        self
    }

    fn subsystem(&self, command: &str, timeout: Duration) -> CommandResult {
        self.executor.run(command, timeout, ExecTarget::Subsystem)
    }

    fn in_project(&self, command: &str) -> String {
        format!("cd {} && {}", self.context.project_dir(), command)
    }

    /// Whether the package is installed in the checkout's venv.
    pub fn is_installed(&self) -> bool {
        let name = self.context.project_name();
        let command = self.in_project(&format!(
            "[ -d ./venv ] && source ./venv/bin/activate && pip list | grep {}",
            quote_posix(&name)
        ));
        let output = self.subsystem(&command, IMPORT_TIMEOUT);
        output.success() && !output.stdout.trim().is_empty()
    }

    fn is_repository(&self) -> bool {
        let command = self.in_project("git rev-parse --is-inside-work-tree 2>/dev/null");
        let output = self.subsystem(&command, QUERY_TIMEOUT);
        output.success() && output.stdout.trim() == "true"
    }

    fn directory_exists(&self) -> bool {
        let command = format!("[ -d {} ]", self.context.project_dir());
        self.subsystem(&command, QUERY_TIMEOUT).success()
    }

    /// Commits separating the checkout from the tracked remote branch, or
    /// `None` when that cannot be determined.
    ///
    /// This fetches from the remote but never touches the working tree.
    pub fn pending_update_count(&self) -> Option<u32> {
        if !self.is_repository() {
            return None;
        }

        let fetch = self.in_project(&format!("{}git fetch origin", self.context.git_proxy_env()));
        if !self.subsystem(&fetch, FETCH_TIMEOUT).success() {
            warn!("[ENV] git fetch failed, update status unknown");
            return None;
        }

        let count = self.in_project(&format!(
            "git rev-list HEAD...origin/{} --count 2>/dev/null",
            quote_posix(&self.context.repo_branch)
        ));
        let output = self.subsystem(&count, QUERY_TIMEOUT);
        if !output.success() {
            return None;
        }
        parse_commit_count(&output.stdout)
    }

    fn pull_step(&self) -> SequenceStep {
        SequenceStep::new(
            "update_project",
            self.in_project(&format!("{}git pull", self.context.git_proxy_env())),
            PULL_TIMEOUT,
        )
    }

    fn clone_step(&self) -> SequenceStep {
        SequenceStep::new(
            "clone_project",
            format!(
                "cd ~ && {}git clone -b {} {}",
                self.context.git_proxy_env(),
                quote_posix(&self.context.repo_branch),
                quote_posix(&self.context.repo_url)
            ),
            CLONE_TIMEOUT,
        )
    }

    /// The ordered steps for `mode`. Directory checks for fresh mode run
    /// here so the plan reflects the checkout's current state.
    pub fn plan(&self, mode: DeployMode) -> CommandSequence<'a, E> {
        let mut sequence =
            CommandSequence::new(self.executor, ExecTarget::Subsystem, self.output.clone());
        let apt = self.context.apt_proxy_options();

        match mode {
            DeployMode::Update => {
                sequence.push(self.pull_step());
            }
            DeployMode::Fresh => {
                if self.directory_exists() {
                    if self.is_repository() {
                        sequence.push(self.pull_step());
                    } else {
                        info!("[ENV] {} is not a git checkout, replacing it", self.context.project_dir());
                        sequence.push(SequenceStep::new(
                            "remove_old_project",
                            format!("rm -rf {}", self.context.project_dir()),
                            QUERY_TIMEOUT * 2,
                        ));
                        sequence.push(self.clone_step());
                    }
                } else {
                    sequence.push(self.clone_step());
                }
                sequence.push(SequenceStep::new(
                    "install_python3_venv",
                    format!(
                        "apt-get{apt} update && DEBIAN_FRONTEND=noninteractive apt-get{apt} install -y python3-venv"
                    ),
                    APT_TIMEOUT,
                ));
            }
        }

        sequence.push(
            SequenceStep::new(
                "install_project",
                self.in_project(&format!(
                    "([ -d ./venv ] || python3 -m venv ./venv) && source ./venv/bin/activate && {}pip install -e '.[gpu]'",
                    self.context.pip_proxy_env()
                )),
                PACKAGE_TIMEOUT,
            )
            .relayed(),
        );

        if mode == DeployMode::Fresh {
            sequence.push(SequenceStep::new(
                "add_cuda_env",
                format!(
                    "grep -q '{bin}' ~/.bashrc || echo 'export PATH={bin}:$PATH' >> ~/.bashrc",
                    bin = CUDA_BIN_DIR
                ),
                QUERY_TIMEOUT,
            ));
        }

        sequence
    }
}

impl<E: CommandExecutor> Component for ProjectDeployment<'_, E> {
    fn kind(&self) -> EnvironmentComponent {
        EnvironmentComponent::ProjectDeployment
    }

    fn check(&self) -> ComponentResult {
        log_start(self.kind(), "Checking");
        let name = self.context.project_name();

        let result = if !self.is_installed() {
            ComponentResult::failed(
                self.kind(),
                format!("Project '{}' is not installed", name),
                failure_codes::PROJECT,
            )
        } else {
            match self.pending_update_count() {
                Some(count) if count > 0 => ComponentResult::warning(
                    self.kind(),
                    format!(
                        "Project '{}' is installed, update available ({} new commits)",
                        name, count
                    ),
                ),
                _ => ComponentResult::skipped(
                    self.kind(),
                    format!("Project '{}' is already installed and up to date", name),
                ),
            }
        };

        log_result("Checking", &result);
        result
    }

    fn install(&self) -> ComponentResult {
        log_start(self.kind(), "Installing");
        let name = self.context.project_name();

        let mode = if self.is_installed() {
            match self.pending_update_count() {
                Some(count) if count > 0 => Some(DeployMode::Update),
                _ => None,
            }
        } else {
            Some(DeployMode::Fresh)
        };

        let result = match mode {
            None => ComponentResult::skipped(
                self.kind(),
                format!("Project '{}' is already installed and up to date", name),
            ),
            Some(mode) => {
                info!("[ENV] Deploying {} ({:?})", name, mode);
                let outcome = self.plan(mode).run(self.kind(), failure_codes::PROJECT);
                if outcome.status == ComponentStatus::Failed {
                    outcome
                } else if self.is_installed() {
                    let verb = match mode {
                        DeployMode::Update => "updated",
                        DeployMode::Fresh => "installed",
                    };
                    ComponentResult::success(
                        self.kind(),
                        format!("Project '{}' {} successfully", name, verb),
                    )
                } else {
                    ComponentResult::failed(
                        self.kind(),
                        format!("Project '{}' installation completed but verification failed", name),
                        failure_codes::PROJECT,
                    )
                }
            }
        };

        log_result("Installing", &result);
        result
    }
}
