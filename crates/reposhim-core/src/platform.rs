//! Operating system and architecture of the machine a binary is resolved for.

use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Os {
    Linux,
    Windows,
    MacOs,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Arch {
    X86_64,
    Aarch64,
    Other(String),
}

/// Platform that a static-mapping lookup resolves binaries for.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Target {
    pub os: Os,
    pub arch: Arch,
}

impl Target {
    pub fn new(os: Os, arch: Arch) -> Self {
        Self { os, arch }
    }

    /// The running platform, or `None` when it is not one of the three
    /// supported operating systems.
    pub fn current() -> Option<Self> {
        let os = std::env::consts::OS.parse().ok()?;
        let arch = Arch::from(std::env::consts::ARCH);
        Some(Self { os, arch })
    }

    /// Archive extension used for binary releases: `zip` on Windows, `tar.gz`
    /// on Linux and `dmg` on macOS.
    pub fn archive_extension(&self) -> &'static str {
        match self.os {
            Os::Windows => "zip",
            Os::Linux => "tar.gz",
            Os::MacOs => "dmg",
        }
    }

    /// Architecture classifier; only aarch64 builds on Linux and macOS carry one.
    pub fn classifier(&self) -> Option<&'static str> {
        match (self.os, &self.arch) {
            (Os::Linux | Os::MacOs, Arch::Aarch64) => Some("aarch64"),
            _ => None,
        }
    }
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.os, self.arch)
    }
}

impl FromStr for Os {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "linux" => Ok(Os::Linux),
            "windows" | "win" => Ok(Os::Windows),
            "macos" | "mac" | "darwin" | "osx" => Ok(Os::MacOs),
            other => Err(format!("unsupported operating system: {other}")),
        }
    }
}

impl fmt::Display for Os {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Os::Linux => "linux",
            Os::Windows => "windows",
            Os::MacOs => "macos",
        })
    }
}

impl From<&str> for Arch {
    fn from(s: &str) -> Self {
        match s.to_ascii_lowercase().as_str() {
            "x86_64" | "amd64" | "x64" => Arch::X86_64,
            "aarch64" | "arm64" => Arch::Aarch64,
            other => Arch::Other(other.to_string()),
        }
    }
}

impl fmt::Display for Arch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Arch::X86_64 => f.write_str("x86_64"),
            Arch::Aarch64 => f.write_str("aarch64"),
            Arch::Other(name) => f.write_str(name),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn archive_extension_per_os() {
        assert_eq!(Target::new(Os::Windows, Arch::X86_64).archive_extension(), "zip");
        assert_eq!(Target::new(Os::Linux, Arch::X86_64).archive_extension(), "tar.gz");
        assert_eq!(Target::new(Os::MacOs, Arch::Aarch64).archive_extension(), "dmg");
    }

    #[test]
    fn classifier_only_for_aarch64_on_unix_likes() {
        assert_eq!(Target::new(Os::Linux, Arch::Aarch64).classifier(), Some("aarch64"));
        assert_eq!(Target::new(Os::MacOs, Arch::Aarch64).classifier(), Some("aarch64"));
        assert_eq!(Target::new(Os::Linux, Arch::X86_64).classifier(), None);
        assert_eq!(Target::new(Os::MacOs, Arch::X86_64).classifier(), None);
        assert_eq!(Target::new(Os::Windows, Arch::Aarch64).classifier(), None);
    }

    #[test]
    fn parse_os_and_arch_aliases() {
        assert_eq!("Darwin".parse::<Os>().unwrap(), Os::MacOs);
        assert_eq!("windows".parse::<Os>().unwrap(), Os::Windows);
        assert!("freebsd".parse::<Os>().is_err());
        assert_eq!(Arch::from("arm64"), Arch::Aarch64);
        assert_eq!(Arch::from("amd64"), Arch::X86_64);
        assert_eq!(Arch::from("riscv64"), Arch::Other("riscv64".to_string()));
    }

    #[test]
    fn display_is_os_dash_arch() {
        assert_eq!(Target::new(Os::Linux, Arch::X86_64).to_string(), "linux-x86_64");
    }
}
