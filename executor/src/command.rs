use crate::error::ExecutorError;

pub const SHELL: &str = "bash";
pub const WORKSPACE_MOUNT: &str = "/workspace";

const NONINTERACTIVE: &str = "export DEBIAN_FRONTEND=noninteractive && ";

/// Builds the text handed to `bash -c`.
///
/// With packages, a quiet apt install runs first. Its failure branch ends in
/// `exit 1`, so the caller's command never runs after a failed install.
pub fn build_shell_command(command: &str, packages: &[String]) -> String {
    let mut full = String::from(NONINTERACTIVE);

    if !packages.is_empty() {
        let pkgs = packages.join(" ");
        let install = format!(
            "apt-get update -qq >/dev/null 2>&1 && \
             apt-get install -y -qq -o Dpkg::Use-Pty=0 {pkgs} >/dev/null 2>&1"
        );
        full.push_str(&format!(
            "({install} && echo '[System] Installed packages: {pkgs}') || \
             (echo '[System] Package installation failed' && exit 1) && "
        ));
    }

    full.push_str(command);
    full
}

pub fn shell_argv(script: String) -> Vec<String> {
    vec![SHELL.to_string(), "-c".to_string(), script]
}

/// Accepts `name[:arch][=version]` with Debian's character sets.
pub fn validate_package(package: &str) -> Result<(), ExecutorError> {
    let invalid = || ExecutorError::InvalidPackage(package.to_string());

    let (name_arch, version) = match package.split_once('=') {
        Some((n, v)) => (n, Some(v)),
        None => (package, None),
    };
    let (name, arch) = match name_arch.split_once(':') {
        Some((n, a)) => (n, Some(a)),
        None => (name_arch, None),
    };

    let mut chars = name.chars();
    let starts_ok = chars
        .next()
        .is_some_and(|c| c.is_ascii_lowercase() || c.is_ascii_digit());
    let rest_ok = chars.all(|c| {
        c.is_ascii_lowercase() || c.is_ascii_digit() || matches!(c, '+' | '-' | '.')
    });
    if !starts_ok || !rest_ok || name.len() < 2 {
        return Err(invalid());
    }

    if let Some(arch) = arch
        && (arch.is_empty()
            || !arch
                .chars()
                .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-'))
    {
        return Err(invalid());
    }

    if let Some(version) = version
        && (version.is_empty()
            || !version
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '+' | '~' | ':' | '-')))
    {
        return Err(invalid());
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_command() {
        assert_eq!(
            build_shell_command("echo Hello", &[]),
            "export DEBIAN_FRONTEND=noninteractive && echo Hello"
        );
    }

    #[test]
    fn test_install_step_short_circuits() {
        let packages = vec!["figlet".to_string(), "file".to_string()];
        let script = build_shell_command("which file", &packages);

        assert_eq!(
            script,
            "export DEBIAN_FRONTEND=noninteractive && \
             (apt-get update -qq >/dev/null 2>&1 && \
             apt-get install -y -qq -o Dpkg::Use-Pty=0 figlet file >/dev/null 2>&1 && \
             echo '[System] Installed packages: figlet file') || \
             (echo '[System] Package installation failed' && exit 1) && which file"
        );
    }

    #[test]
    fn test_shell_argv() {
        assert_eq!(
            shell_argv("true".to_string()),
            vec!["bash".to_string(), "-c".to_string(), "true".to_string()]
        );
    }

    #[test]
    fn test_valid_packages() {
        for package in [
            "file",
            "g++",
            "python3.12",
            "libssl-dev",
            "libc6:amd64",
            "curl=8.5.0-2ubuntu10",
            "nginx=1:1.24.0~ubuntu",
        ] {
            assert!(validate_package(package).is_ok(), "{package} should be accepted");
        }
    }

    #[test]
    fn test_invalid_packages() {
        for package in [
            "",
            "x",
            "Curl",
            "curl; rm -rf /",
            "$(reboot)",
            "-o",
            "pkg=",
            "pkg:",
            "a b",
            "pkg'",
        ] {
            assert!(
                matches!(validate_package(package), Err(ExecutorError::InvalidPackage(_))),
                "{package:?} should be rejected"
            );
        }
    }
}
