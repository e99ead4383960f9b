//! Configuration keys and their built-in defaults.

/// Proxy used for git, apt and pip traffic inside the subsystem.
pub const KEY_PROXY_URL: &str = "proxy_url";

/// WSL distribution that hosts the runtime.
pub const KEY_WSL_LINUX_DISTRO: &str = "wsl_linux_distro";

/// Download location of the WSL installer package.
pub const KEY_WSL_INSTALLER_URL: &str = "wsl_installer_url";

/// Download location of the WSL kernel update package.
pub const KEY_WSL_KERNEL_URL: &str = "wsl_kernel_url";

/// Repository cloned by project deployment.
pub const KEY_PRAKASA_GIT_REPO_URL: &str = "prakasa_git_repo_url";

/// Branch project deployment tracks.
pub const KEY_PRAKASA_GIT_BRANCH: &str = "prakasa_git_branch";

/// Keys with a built-in default. An empty value for one of these in the
/// file is replaced by the default on load.
pub const BUILTIN_DEFAULTS: &[(&str, &str)] = &[
    (KEY_WSL_LINUX_DISTRO, "Ubuntu-24.04"),
    (
        KEY_WSL_INSTALLER_URL,
        "https://github.com/microsoft/WSL/releases/download/2.4.13/wsl.2.4.13.0.x64.msi",
    ),
    (
        KEY_WSL_KERNEL_URL,
        "https://wslstorestorage.blob.core.windows.net/wslblob/wsl_update_x64.msi",
    ),
    (
        KEY_PRAKASA_GIT_REPO_URL,
        "https://github.com/hetu-project/prakasa.git",
    ),
    (KEY_PRAKASA_GIT_BRANCH, "main"),
];

/// Every key the CLI accepts.
pub const VALID_KEYS: &[&str] = &[
    KEY_PROXY_URL,
    KEY_WSL_LINUX_DISTRO,
    KEY_WSL_INSTALLER_URL,
    KEY_WSL_KERNEL_URL,
    KEY_PRAKASA_GIT_REPO_URL,
    KEY_PRAKASA_GIT_BRANCH,
];

/// Built-in default for `key`, if it has one.
pub fn default_for(key: &str) -> Option<&'static str> {
    BUILTIN_DEFAULTS
        .iter()
        .find(|(k, _)| *k == key)
        .map(|(_, v)| *v)
}

/// Whether `key` is a recognised configuration key.
pub fn is_valid_key(key: &str) -> bool {
    VALID_KEYS.contains(&key)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_default_is_a_valid_key() {
        for (key, _) in BUILTIN_DEFAULTS {
            assert!(is_valid_key(key), "{} missing from VALID_KEYS", key);
        }
    }

    #[test]
    fn proxy_has_no_default() {
        assert!(is_valid_key(KEY_PROXY_URL));
        assert_eq!(default_for(KEY_PROXY_URL), None);
    }

    #[test]
    fn distro_default() {
        assert_eq!(default_for(KEY_WSL_LINUX_DISTRO), Some("Ubuntu-24.04"));
    }

    #[test]
    fn unknown_key_is_invalid() {
        assert!(!is_valid_key("pip_index_url"));
        assert!(!is_valid_key(""));
    }
}
