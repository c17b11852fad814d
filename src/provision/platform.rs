//! Host platform detection and the release artifact matrix.
//!
//! Every supported `(os, arch)` pair maps to exactly one binary name. The
//! artifact that carries the binary is described by [`ArtifactFormat`],
//! resolved here once so extraction never has to sniff bytes.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::errors::ProvisionError;

/// Name of the wrapped tool, used for binary names and cache layout.
pub const TOOL_NAME: &str = "agfapi";

/// Supported operating systems.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Os {
    Linux,
    Windows,
}

impl Os {
    pub fn as_str(&self) -> &'static str {
        match self {
            Os::Linux => "linux",
            Os::Windows => "windows",
        }
    }
}

/// Supported CPU architectures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Arch {
    X86_64,
    Arm64,
}

impl Arch {
    pub fn as_str(&self) -> &'static str {
        match self {
            Arch::X86_64 => "x86_64",
            Arch::Arm64 => "arm64",
        }
    }
}

/// An `(os, arch)` pair from the support matrix.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PlatformKey {
    pub os: Os,
    pub arch: Arch,
}

impl PlatformKey {
    /// Detects the platform this process is running on.
    pub fn detect() -> Result<Self, ProvisionError> {
        Self::from_host(std::env::consts::OS, std::env::consts::ARCH)
    }

    /// Maps raw OS and machine strings onto the support matrix.
    ///
    /// Both strings are compared case-insensitively. ARM64 is accepted under
    /// either of its spellings (`aarch64` and `arm64`).
    pub fn from_host(os: &str, arch: &str) -> Result<Self, ProvisionError> {
        let unsupported = || ProvisionError::UnsupportedPlatform {
            os: os.to_string(),
            arch: arch.to_string(),
        };

        let os_key = match os.to_ascii_lowercase().as_str() {
            "linux" => Os::Linux,
            "windows" => Os::Windows,
            _ => return Err(unsupported()),
        };

        let machine = arch.to_ascii_lowercase();
        let arch_key = if machine.contains("aarch64") || machine.contains("arm64") {
            Arch::Arm64
        } else if matches!(machine.as_str(), "x86_64" | "amd64" | "x64") {
            Arch::X86_64
        } else {
            return Err(unsupported());
        };

        Ok(PlatformKey {
            os: os_key,
            arch: arch_key,
        })
    }

    /// Name of the executable for this platform, e.g. `agfapi_linux_x86_64`.
    pub fn binary_name(&self) -> String {
        let stem = self.binary_stem();
        match self.os {
            Os::Windows => format!("{}.exe", stem),
            Os::Linux => stem,
        }
    }

    fn binary_stem(&self) -> String {
        format!("{}_{}_{}", TOOL_NAME, self.os.as_str(), self.arch.as_str())
    }

    /// Describes the release asset that carries this platform's binary.
    pub fn artifact(&self, format: ArtifactFormat) -> Artifact {
        let binary_name = self.binary_name();
        let name = match format.suffix() {
            Some(suffix) => format!("{}{}", self.binary_stem(), suffix),
            None => binary_name.clone(),
        };

        Artifact {
            name,
            binary_name,
            format,
        }
    }
}

impl fmt::Display for PlatformKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.os.as_str(), self.arch.as_str())
    }
}

/// How a release asset packages the executable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum ArtifactFormat {
    /// The asset is the executable itself.
    #[default]
    #[serde(rename = "raw")]
    Raw,
    /// Gzip-compressed tar archive (.tar.gz, .tgz)
    #[serde(rename = "tar.gz", alias = "tgz")]
    TarGz,
    /// ZIP archive (.zip)
    #[serde(rename = "zip")]
    Zip,
}

impl ArtifactFormat {
    fn suffix(&self) -> Option<&'static str> {
        match self {
            ArtifactFormat::Raw => None,
            ArtifactFormat::TarGz => Some(".tar.gz"),
            ArtifactFormat::Zip => Some(".zip"),
        }
    }
}

impl fmt::Display for ArtifactFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArtifactFormat::Raw => write!(f, "raw"),
            ArtifactFormat::TarGz => write!(f, "tar.gz"),
            ArtifactFormat::Zip => write!(f, "zip"),
        }
    }
}

/// A downloadable release asset.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Artifact {
    /// File name of the asset on the release page
    pub name: String,

    /// Name of the executable once installed
    pub binary_name: String,

    pub format: ArtifactFormat,
}
