//! Read-only settings shared by every component during a run.

use crate::config::{
    default_for, ConfigStore, KEY_PRAKASA_GIT_BRANCH, KEY_PRAKASA_GIT_REPO_URL, KEY_PROXY_URL,
    KEY_WSL_INSTALLER_URL, KEY_WSL_KERNEL_URL, KEY_WSL_LINUX_DISTRO,
};
use crate::shell::quote_posix;

/// Directory and package name used when the repository URL yields none.
const FALLBACK_PROJECT_NAME: &str = "prakasa";

/// CUDA toolkit binaries inside the subsystem.
pub const CUDA_BIN_DIR: &str = "/usr/local/cuda-12.8/bin";

/// Settings for one check or install run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecutionContext {
    pub subsystem_distro_id: String,
    pub proxy_url: Option<String>,
    pub repo_url: String,
    pub repo_branch: String,
    pub wsl_installer_url: String,
    pub wsl_kernel_url: String,
}

impl ExecutionContext {
    /// Context for `distro` with built-in defaults everywhere else.
    pub fn new(distro: impl Into<String>) -> Self {
        Self {
            subsystem_distro_id: distro.into(),
            proxy_url: None,
            repo_url: builtin(KEY_PRAKASA_GIT_REPO_URL),
            repo_branch: builtin(KEY_PRAKASA_GIT_BRANCH),
            wsl_installer_url: builtin(KEY_WSL_INSTALLER_URL),
            wsl_kernel_url: builtin(KEY_WSL_KERNEL_URL),
        }
    }

    /// Snapshot the values a run needs. The store is only read.
    pub fn from_config(config: &ConfigStore) -> Self {
        let read = |key: &str| config.get_config_value(key, default_for(key).unwrap_or(""));
        let proxy = read(KEY_PROXY_URL);

        Self {
            subsystem_distro_id: read(KEY_WSL_LINUX_DISTRO),
            proxy_url: Some(proxy.trim().to_string()).filter(|p| !p.is_empty()),
            repo_url: read(KEY_PRAKASA_GIT_REPO_URL),
            repo_branch: read(KEY_PRAKASA_GIT_BRANCH),
            wsl_installer_url: read(KEY_WSL_INSTALLER_URL),
            wsl_kernel_url: read(KEY_WSL_KERNEL_URL),
        }
    }

    pub fn with_proxy(mut self, proxy: impl Into<String>) -> Self {
        self.proxy_url = Some(proxy.into());
        self
    }

    pub fn with_repository(mut self, url: impl Into<String>, branch: impl Into<String>) -> Self {
        self.repo_url = url.into();
        self.repo_branch = branch.into();
        self
    }

    /// The configured proxy, if any.
    pub fn proxy(&self) -> Option<&str> {
        self.proxy_url.as_deref()
    }

    /// Name of the checked-out project: the last path segment of the
    /// repository URL without `.git`. Also the installed package name.
    pub fn project_name(&self) -> String {
        let segment = self
            .repo_url
            .trim_end_matches('/')
            .rsplit(['/', ':'])
            .next()
            .unwrap_or_default();
        let name = segment.strip_suffix(".git").unwrap_or(segment);

        let safe = !name.is_empty()
            && name
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_' || c == '.')
            && name != "."
            && name != "..";
        if safe {
            name.to_string()
        } else {
            FALLBACK_PROJECT_NAME.to_string()
        }
    }

    /// Project checkout directory inside the subsystem, in `~` form.
    pub fn project_dir(&self) -> String {
        format!("~/{}", self.project_name())
    }

    /// Enter the checkout with the CUDA toolkit first on `PATH`, Windows
    /// interop paths under `/mnt/c` dropped, and the virtualenv active.
    /// `bash -lc` never reads `~/.bashrc`, so the PATH is set here.
    pub fn venv_activation(&self) -> String {
        format!(
            "cd {} && export PATH={}:$(echo \"$PATH\" | tr ':' '\\n' | grep -v '/mnt/c' | paste -sd ':' -) && source ./venv/bin/activate",
            self.project_dir(),
            CUDA_BIN_DIR
        )
    }

    /// `-o` options routing apt through the proxy, with a leading space,
    /// or an empty string. Each option is a single quoted shell word.
    pub fn apt_proxy_options(&self) -> String {
        match self.proxy() {
            Some(p) => format!(
                " -o {} -o {}",
                quote_posix(&format!("Acquire::http::proxy={p}")),
                quote_posix(&format!("Acquire::https::proxy={p}"))
            ),
            None => String::new(),
        }
    }

    /// Environment prefix routing git through the proxy, or empty.
    pub fn git_proxy_env(&self) -> String {
        match self.proxy() {
            Some(p) => format!("ALL_PROXY={} ", quote_posix(p)),
            None => String::new(),
        }
    }

    /// Environment prefix routing pip through the proxy, or empty.
    pub fn pip_proxy_env(&self) -> String {
        match self.proxy() {
            Some(p) => {
                let quoted = quote_posix(p);
                format!("HTTP_PROXY={quoted} HTTPS_PROXY={quoted} ")
            }
            None => String::new(),
        }
    }
}

fn builtin(key: &str) -> String {
    default_for(key).unwrap_or_default().to_string()
}
