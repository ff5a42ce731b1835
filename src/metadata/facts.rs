//! Host facts recorded into the experiment metadata document.

use super::probe::{probe_gpu, CommandRunner, CpuInfo, GpuInfo, HardwareProber, MemoryInfo};
use super::writer::{FactValue, MetadataPatch};
use crate::context::GenerationContext;
use std::path::Path;

pub const DEFAULT_LOCALE: &str = "en_US.UTF-8";
pub const DEFAULT_TIMEZONE: &str = "UTC";

const SYSTEM_PATH: &[&str] = &["experiment", "environment", "system"];
const HARDWARE_PATH: &[&str] = &["experiment", "environment", "hardware"];
const SOFTWARE_PATH: &[&str] = &["experiment", "environment", "software"];

/// Which of the optional subtrees the loaded document declares.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Subtrees {
    pub system: bool,
    pub hardware: bool,
    pub software: bool,
}

impl Subtrees {
    pub fn detect(document: &toml::Table) -> Self {
        let present = |path: &[&str]| {
            let mut current = document;
            for key in path {
                match current.get(*key).and_then(toml::Value::as_table) {
                    Some(table) => current = table,
                    None => return false,
                }
            }
            true
        };
        Self {
            system: present(SYSTEM_PATH),
            hardware: present(HARDWARE_PATH),
            software: present(SOFTWARE_PATH),
        }
    }

    pub fn any(&self) -> bool {
        self.system || self.hardware || self.software
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OsInfo {
    pub name: String,
    pub version: String,
    pub kernel: String,
    pub architecture: String,
    pub locale: String,
    pub timezone: String,
}

impl OsInfo {
    pub fn collect(runner: &dyn CommandRunner) -> Self {
        let env = |key: &str| std::env::var(key).ok().filter(|v| !v.trim().is_empty());

        let version = match std::env::consts::OS {
            "linux" => std::fs::read_to_string("/etc/os-release")
                .ok()
                .and_then(|content| parse_os_release(&content))
                .or_else(|| runner.run("uname", &["-v"]).map(|v| v.trim().to_string())),
            "macos" => runner.run("sw_vers", &["-productVersion"]).map(|v| v.trim().to_string()),
            "windows" => runner.run("cmd", &["/C", "ver"]).map(|v| v.trim().to_string()),
            _ => None,
        };
        let kernel = runner.run("uname", &["-r"]).map(|v| v.trim().to_string());

        let timezone = env("TZ")
            .or_else(|| {
                std::fs::read_to_string("/etc/timezone")
                    .ok()
                    .map(|tz| tz.trim().to_string())
                    .filter(|tz| !tz.is_empty())
            })
            .or_else(|| {
                std::fs::read_link("/etc/localtime")
                    .ok()
                    .and_then(|target| timezone_from_zoneinfo(&target))
            });

        Self {
            name: os_name(std::env::consts::OS).to_string(),
            version: version.unwrap_or_default(),
            kernel: kernel.unwrap_or_default(),
            architecture: std::env::consts::ARCH.to_string(),
            locale: env("LC_ALL").or_else(|| env("LANG")).unwrap_or_else(|| DEFAULT_LOCALE.to_string()),
            timezone: timezone.unwrap_or_else(|| DEFAULT_TIMEZONE.to_string()),
        }
    }
}

/// Maps `std::env::consts::OS` to the names `uname -s` / `platform.system()` report.
pub fn os_name(os: &str) -> &str {
    match os {
        "linux" => "Linux",
        "macos" => "Darwin",
        "windows" => "Windows",
        other => other,
    }
}

/// `PRETTY_NAME` from `/etc/os-release`, unquoted.
pub fn parse_os_release(content: &str) -> Option<String> {
    content
        .lines()
        .find_map(|line| line.strip_prefix("PRETTY_NAME="))
        .map(|value| value.trim().trim_matches('"').to_string())
        .filter(|value| !value.is_empty())
}

/// `/usr/share/zoneinfo/Europe/Berlin` -> `Europe/Berlin`.
pub fn timezone_from_zoneinfo(target: &Path) -> Option<String> {
    let target = target.to_str()?;
    let (_, zone) = target.split_once("zoneinfo/")?;
    (!zone.is_empty()).then(|| zone.to_string())
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SoftwareVersions {
    pub python_version: String,
    pub conda_version: Option<String>,
    pub cuda_version: Option<String>,
}

impl SoftwareVersions {
    pub fn collect(context: &GenerationContext, runner: &dyn CommandRunner) -> Self {
        let python_version = ["python3", "python"]
            .iter()
            .find_map(|python| runner.run(python, &["--version"]))
            .and_then(|out| version_after(&out, "Python"))
            .unwrap_or_else(|| context.python_version.clone());
        let conda_version = runner
            .run("conda", &["--version"])
            .and_then(|out| version_after(&out, "conda"));
        let cuda_version = if context.with_cuda {
            runner.run("nvcc", &["--version"]).and_then(|out| parse_nvcc_release(&out))
        } else {
            None
        };

        Self { python_version, conda_version, cuda_version }
    }
}

/// `Python 3.11.4` -> `3.11.4`, when the output starts with `prefix`.
fn version_after(output: &str, prefix: &str) -> Option<String> {
    let line = output.lines().map(str::trim).find(|l| l.starts_with(prefix))?;
    line.split_whitespace().nth(1).map(str::to_string)
}

/// Extracts `12.2` from nvcc's `Cuda compilation tools, release 12.2, V12.2.140`.
pub fn parse_nvcc_release(output: &str) -> Option<String> {
    let (_, rest) = output.split_once("release ")?;
    let release = rest.split([',', ' ', '\n']).next()?.trim();
    (!release.is_empty()).then(|| release.to_string())
}

/// Everything the reconciler may write, gathered once.
#[derive(Debug, Clone, Default)]
pub struct HostFacts {
    pub os: Option<OsInfo>,
    pub cpu: Option<CpuInfo>,
    pub memory: Option<MemoryInfo>,
    pub gpu: Option<GpuInfo>,
    pub software: Option<SoftwareVersions>,
}

impl HostFacts {
    /// Probes only what the present subtrees can hold.
    pub fn collect(
        subtrees: Subtrees,
        context: &GenerationContext,
        prober: &dyn HardwareProber,
        runner: &dyn CommandRunner,
    ) -> Self {
        let mut facts = Self::default();
        if subtrees.system {
            facts.os = Some(OsInfo::collect(runner));
        }
        if subtrees.hardware {
            facts.cpu = Some(prober.cpu(runner));
            facts.memory = Some(prober.memory(runner));
            if context.with_cuda {
                facts.gpu = probe_gpu(runner);
            }
        }
        if subtrees.software {
            facts.software = Some(SoftwareVersions::collect(context, runner));
        }
        facts
    }

    /// Turns the collected facts into document patches. Empty records yield
    /// no patch, so their subtree is left untouched.
    pub fn patches(&self) -> Vec<MetadataPatch> {
        let mut patches = Vec::new();

        if let Some(os) = &self.os {
            patches.push(MetadataPatch {
                parent: SYSTEM_PATH,
                leaf: Some("os"),
                replace_leaf: true,
                entries: vec![
                    ("name", FactValue::from(&os.name)),
                    ("version", FactValue::from(&os.version)),
                    ("kernel", FactValue::from(&os.kernel)),
                    ("architecture", FactValue::from(&os.architecture)),
                    ("locale", FactValue::from(&os.locale)),
                    ("timezone", FactValue::from(&os.timezone)),
                ],
            });
        }

        if let Some(cpu) = &self.cpu {
            let mut entries = Vec::new();
            push_text(&mut entries, "model", &cpu.model);
            push_text(&mut entries, "architecture", &cpu.architecture);
            push_int(&mut entries, "cores", cpu.cores);
            push_int(&mut entries, "threads", cpu.threads);
            push_text(&mut entries, "frequency", &cpu.frequency);
            patches.push(MetadataPatch {
                parent: HARDWARE_PATH,
                leaf: Some("cpu"),
                replace_leaf: false,
                entries,
            });
        }

        if let Some(memory) = &self.memory {
            let mut entries = Vec::new();
            push_text(&mut entries, "size", &memory.size);
            push_text(&mut entries, "type", &memory.memory_type);
            patches.push(MetadataPatch {
                parent: HARDWARE_PATH,
                leaf: Some("memory"),
                replace_leaf: false,
                entries,
            });
        }

        if let Some(gpu) = &self.gpu {
            let mut entries = Vec::new();
            push_text(&mut entries, "model", &gpu.model);
            push_text(&mut entries, "memory", &gpu.memory);
            push_text(&mut entries, "driver_version", &gpu.driver_version);
            patches.push(MetadataPatch {
                parent: HARDWARE_PATH,
                leaf: Some("gpu"),
                replace_leaf: false,
                entries,
            });
        }

        if let Some(software) = &self.software {
            let mut entries = vec![("python_version", FactValue::from(&software.python_version))];
            push_text(&mut entries, "conda_version", &software.conda_version);
            push_text(&mut entries, "cuda_version", &software.cuda_version);
            patches.push(MetadataPatch {
                parent: SOFTWARE_PATH,
                leaf: None,
                replace_leaf: false,
                entries,
            });
        }

        patches.retain(|patch| !patch.entries.is_empty());
        patches
    }
}

fn push_text(entries: &mut Vec<(&'static str, FactValue)>, key: &'static str, value: &Option<String>) {
    if let Some(value) = value.as_deref().filter(|v| !v.is_empty()) {
        entries.push((key, FactValue::Text(value.to_string())));
    }
}

fn push_int(entries: &mut Vec<(&'static str, FactValue)>, key: &'static str, value: Option<u32>) {
    if let Some(value) = value {
        entries.push((key, FactValue::Integer(i64::from(value))));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_os_release() {
        let content = "NAME=\"Ubuntu\"\nPRETTY_NAME=\"Ubuntu 22.04.3 LTS\"\nID=ubuntu\n";
        assert_eq!(parse_os_release(content).as_deref(), Some("Ubuntu 22.04.3 LTS"));
        assert_eq!(parse_os_release("ID=arch\n"), None);
    }

    #[test]
    fn test_timezone_from_zoneinfo() {
        let target = Path::new("/usr/share/zoneinfo/Europe/Berlin");
        assert_eq!(timezone_from_zoneinfo(target).as_deref(), Some("Europe/Berlin"));
        assert_eq!(timezone_from_zoneinfo(Path::new("/etc/UTC")), None);
    }

    #[test]
    fn test_parse_nvcc_release() {
        let out = "nvcc: NVIDIA (R) Cuda compiler driver\nCuda compilation tools, release 12.2, V12.2.140\n";
        assert_eq!(parse_nvcc_release(out).as_deref(), Some("12.2"));
        assert_eq!(parse_nvcc_release("nvcc: not found"), None);
    }

    #[test]
    fn test_version_after() {
        assert_eq!(version_after("Python 3.11.4\n", "Python").as_deref(), Some("3.11.4"));
        assert_eq!(version_after("conda 23.7.2", "conda").as_deref(), Some("23.7.2"));
        assert_eq!(version_after("garbage", "conda"), None);
    }

    #[test]
    fn test_only_os_patch_replaces_its_leaf() {
        let facts = HostFacts {
            os: Some(OsInfo { name: "Linux".to_string(), ..OsInfo::default() }),
            memory: Some(MemoryInfo { size: Some("8.0 GB".to_string()), memory_type: None }),
            ..HostFacts::default()
        };
        let patches = facts.patches();
        assert_eq!(patches.len(), 2);
        assert_eq!(patches[0].leaf, Some("os"));
        assert!(patches[0].replace_leaf);
        assert_eq!(patches[1].leaf, Some("memory"));
        assert!(!patches[1].replace_leaf);
    }

    #[test]
    fn test_empty_probe_yields_no_patch() {
        let facts = HostFacts { cpu: Some(CpuInfo::default()), ..HostFacts::default() };
        assert!(facts.patches().is_empty());
    }
}
