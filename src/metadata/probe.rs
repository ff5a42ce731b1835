//! Best-effort hardware probing.
//!
//! Every probe is a total function: a missing tool, a non-zero exit or output
//! that does not parse leaves the corresponding field empty. Nothing here
//! returns an error.

use indexmap::IndexMap;
use log::debug;
use std::process::Command;

/// Runs external programs and returns their stdout.
pub trait CommandRunner {
    /// Runs `program` with `args` synchronously.
    ///
    /// # Returns
    /// * `Some(stdout)` if the program ran and exited successfully
    /// * `None` otherwise (missing binary, non-zero exit, non-UTF-8 output)
    fn run(&self, program: &str, args: &[&str]) -> Option<String>;
}

/// [`CommandRunner`] backed by `std::process::Command`. Calls block until the
/// child exits; there is no timeout.
#[derive(Debug, Default)]
pub struct SystemCommandRunner;

impl CommandRunner for SystemCommandRunner {
    fn run(&self, program: &str, args: &[&str]) -> Option<String> {
        let output = match Command::new(program).args(args).output() {
            Ok(output) => output,
            Err(e) => {
                debug!("Could not run {program}: {e}");
                return None;
            }
        };
        if !output.status.success() {
            debug!("{program} {} exited with {}", args.join(" "), output.status);
            return None;
        }
        String::from_utf8(output.stdout).ok()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CpuInfo {
    pub model: Option<String>,
    pub architecture: Option<String>,
    pub cores: Option<u32>,
    pub threads: Option<u32>,
    pub frequency: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MemoryInfo {
    pub size: Option<String>,
    pub memory_type: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GpuInfo {
    pub model: Option<String>,
    pub memory: Option<String>,
    pub driver_version: Option<String>,
}

/// Platform-specific CPU and memory discovery.
pub trait HardwareProber {
    fn cpu(&self, runner: &dyn CommandRunner) -> CpuInfo;
    fn memory(&self, runner: &dyn CommandRunner) -> MemoryInfo;
}

/// Linux: `lscpu`, `free -b` and `dmidecode`.
#[derive(Debug, Default)]
pub struct LinuxProber;

/// macOS: `sysctl` and `system_profiler`.
#[derive(Debug, Default)]
pub struct MacosProber;

/// Windows: `wmic ... /format:csv`.
#[derive(Debug, Default)]
pub struct WindowsProber;

/// Platforms without a dedicated prober; every field stays empty.
#[derive(Debug, Default)]
pub struct NullProber;

/// Selects the prober for the platform this binary runs on.
pub fn prober_for_host() -> Box<dyn HardwareProber> {
    match std::env::consts::OS {
        "linux" => Box::new(LinuxProber),
        "macos" => Box::new(MacosProber),
        "windows" => Box::new(WindowsProber),
        other => {
            debug!("No hardware prober for {other}");
            Box::new(NullProber)
        }
    }
}

impl HardwareProber for LinuxProber {
    fn cpu(&self, runner: &dyn CommandRunner) -> CpuInfo {
        runner.run("lscpu", &[]).map(|out| parse_lscpu(&out)).unwrap_or_default()
    }

    fn memory(&self, runner: &dyn CommandRunner) -> MemoryInfo {
        MemoryInfo {
            size: runner.run("free", &["-b"]).and_then(|out| parse_free(&out)),
            memory_type: runner
                .run("dmidecode", &["-t", "memory"])
                .and_then(|out| parse_memory_type(&out)),
        }
    }
}

impl HardwareProber for MacosProber {
    fn cpu(&self, runner: &dyn CommandRunner) -> CpuInfo {
        let sysctl = |key: &str| {
            runner
                .run("sysctl", &["-n", key])
                .map(|out| out.trim().to_string())
                .filter(|out| !out.is_empty())
        };
        CpuInfo {
            model: sysctl("machdep.cpu.brand_string"),
            architecture: sysctl("hw.machine"),
            cores: sysctl("hw.physicalcpu").and_then(|v| v.parse().ok()),
            threads: sysctl("hw.logicalcpu").and_then(|v| v.parse().ok()),
            // Not exposed on Apple silicon.
            frequency: sysctl("hw.cpufrequency")
                .and_then(|v| v.parse::<f64>().ok())
                .map(|hz| format_mhz(hz / 1_000_000.0)),
        }
    }

    fn memory(&self, runner: &dyn CommandRunner) -> MemoryInfo {
        MemoryInfo {
            size: runner
                .run("sysctl", &["-n", "hw.memsize"])
                .and_then(|v| v.trim().parse::<u64>().ok())
                .map(format_bytes),
            memory_type: runner
                .run("system_profiler", &["SPMemoryDataType"])
                .and_then(|out| parse_memory_type(&out)),
        }
    }
}

impl HardwareProber for WindowsProber {
    fn cpu(&self, runner: &dyn CommandRunner) -> CpuInfo {
        let Some(out) = runner.run(
            "wmic",
            &["cpu", "get", "Name,NumberOfCores,NumberOfLogicalProcessors,MaxClockSpeed", "/format:csv"],
        ) else {
            return CpuInfo::default();
        };
        let Some(row) = parse_csv(&out).into_iter().next() else {
            return CpuInfo::default();
        };
        CpuInfo {
            model: row.get("Name").cloned().filter(|v| !v.is_empty()),
            architecture: Some(std::env::consts::ARCH.to_string()),
            cores: row.get("NumberOfCores").and_then(|v| v.parse().ok()),
            threads: row.get("NumberOfLogicalProcessors").and_then(|v| v.parse().ok()),
            frequency: row
                .get("MaxClockSpeed")
                .and_then(|v| v.parse::<f64>().ok())
                .map(format_mhz),
        }
    }

    fn memory(&self, runner: &dyn CommandRunner) -> MemoryInfo {
        runner
            .run("wmic", &["memorychip", "get", "Capacity,SMBIOSMemoryType", "/format:csv"])
            .map(|out| parse_wmic_memory(&out))
            .unwrap_or_default()
    }
}

impl HardwareProber for NullProber {
    fn cpu(&self, _runner: &dyn CommandRunner) -> CpuInfo {
        CpuInfo::default()
    }

    fn memory(&self, _runner: &dyn CommandRunner) -> MemoryInfo {
        MemoryInfo::default()
    }
}

/// Queries the first NVIDIA GPU. `None` when `nvidia-smi` is unavailable.
pub fn probe_gpu(runner: &dyn CommandRunner) -> Option<GpuInfo> {
    let out = runner.run(
        "nvidia-smi",
        &["--query-gpu=name,memory.total,driver_version", "--format=csv,noheader"],
    )?;
    parse_nvidia_smi(&out)
}

/// Parses `key: value` lines into an ordered map; later duplicates are ignored.
pub fn parse_key_values(output: &str) -> IndexMap<String, String> {
    let mut values = IndexMap::new();
    for line in output.lines() {
        if let Some((key, value)) = line.split_once(':') {
            values
                .entry(key.trim().to_string())
                .or_insert_with(|| value.trim().to_string());
        }
    }
    values
}

/// Parses `wmic /format:csv` output into one map per data row.
pub fn parse_csv(output: &str) -> Vec<IndexMap<String, String>> {
    let mut lines = output.lines().map(str::trim).filter(|line| !line.is_empty());
    let Some(header) = lines.next() else {
        return Vec::new();
    };
    let columns: Vec<&str> = header.split(',').map(str::trim).collect();
    lines
        .map(|line| {
            columns
                .iter()
                .zip(line.split(',').map(str::trim))
                .map(|(column, value)| (column.to_string(), value.to_string()))
                .collect()
        })
        .collect()
}

fn parse_lscpu(output: &str) -> CpuInfo {
    let fields = parse_key_values(output);
    let number = |key: &str| fields.get(key).and_then(|v| v.parse::<u32>().ok());

    let cores = match (number("Core(s) per socket"), number("Socket(s)")) {
        (Some(per_socket), Some(sockets)) => per_socket.checked_mul(sockets),
        (Some(per_socket), None) => Some(per_socket),
        _ => None,
    };
    let frequency = ["CPU max MHz", "CPU MHz"]
        .iter()
        .find_map(|key| fields.get(*key).and_then(|v| v.parse::<f64>().ok()))
        .map(format_mhz);

    CpuInfo {
        model: fields.get("Model name").cloned(),
        architecture: fields.get("Architecture").cloned(),
        cores,
        threads: number("CPU(s)"),
        frequency,
    }
}

fn parse_free(output: &str) -> Option<String> {
    output
        .lines()
        .find(|line| line.starts_with("Mem:"))
        .and_then(|line| line.split_whitespace().nth(1))
        .and_then(|total| total.parse::<u64>().ok())
        .map(format_bytes)
}

/// First meaningful `Type:` entry of `dmidecode` / `system_profiler` output.
fn parse_memory_type(output: &str) -> Option<String> {
    output
        .lines()
        .filter_map(|line| line.trim().strip_prefix("Type:"))
        .map(str::trim)
        .find(|kind| !kind.is_empty() && !matches!(*kind, "Unknown" | "Other"))
        .map(str::to_string)
}

fn parse_wmic_memory(output: &str) -> MemoryInfo {
    let rows = parse_csv(output);
    let total: u64 = rows
        .iter()
        .filter_map(|row| row.get("Capacity").and_then(|v| v.parse::<u64>().ok()))
        .sum();
    let memory_type = rows
        .iter()
        .filter_map(|row| row.get("SMBIOSMemoryType").and_then(|v| v.parse::<u32>().ok()))
        .find_map(smbios_memory_type)
        .map(str::to_string);

    MemoryInfo {
        size: (total > 0).then(|| format_bytes(total)),
        memory_type,
    }
}

fn smbios_memory_type(code: u32) -> Option<&'static str> {
    match code {
        20 => Some("DDR"),
        21 => Some("DDR2"),
        24 => Some("DDR3"),
        26 => Some("DDR4"),
        34 => Some("DDR5"),
        35 => Some("LPDDR5"),
        _ => None,
    }
}

fn parse_nvidia_smi(output: &str) -> Option<GpuInfo> {
    let line = output.lines().map(str::trim).find(|line| !line.is_empty())?;
    // Columns are positional; an empty or `[N/A]` column is unknown.
    let mut fields = line.splitn(3, ',').map(|field| {
        let field = field.trim();
        (!field.is_empty() && field != "[N/A]").then(|| field.to_string())
    });
    let model = fields.next().flatten()?;
    Some(GpuInfo {
        model: Some(model),
        memory: fields.next().flatten(),
        driver_version: fields.next().flatten(),
    })
}

/// Formats a byte count as gibibytes, e.g. `15.5 GB`.
pub fn format_bytes(bytes: u64) -> String {
    format!("{:.1} GB", bytes as f64 / (1024.0 * 1024.0 * 1024.0))
}

/// Formats a clock speed given in MHz, e.g. `3.60 GHz`.
pub fn format_mhz(mhz: f64) -> String {
    format!("{:.2} GHz", mhz / 1000.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    const LSCPU: &str = "Architecture:            x86_64
  CPU op-mode(s):        32-bit, 64-bit
CPU(s):                  16
Model name:              AMD Ryzen 7 5800X 8-Core Processor
    Thread(s) per core:  2
    Core(s) per socket:  8
    Socket(s):           1
    CPU max MHz:         4850.1948
";

    #[test]
    fn test_parse_lscpu() {
        let cpu = parse_lscpu(LSCPU);
        assert_eq!(cpu.model.as_deref(), Some("AMD Ryzen 7 5800X 8-Core Processor"));
        assert_eq!(cpu.architecture.as_deref(), Some("x86_64"));
        assert_eq!(cpu.cores, Some(8));
        assert_eq!(cpu.threads, Some(16));
        assert_eq!(cpu.frequency.as_deref(), Some("4.85 GHz"));
    }

    #[test]
    fn test_parse_free() {
        let out = "               total        used        free\nMem:     16777216000  4000000000  9000000000\nSwap:              0           0           0\n";
        assert_eq!(parse_free(out).as_deref(), Some("15.6 GB"));
        assert_eq!(parse_free("garbage"), None);
    }

    #[test]
    fn test_parse_memory_type_skips_unknown() {
        let out = "Memory Device\n\tError Correction Type: None\n\tType: Unknown\nMemory Device\n\tType: DDR4\n";
        assert_eq!(parse_memory_type(out).as_deref(), Some("DDR4"));
    }

    #[test]
    fn test_parse_wmic_memory() {
        let out = "\r\nNode,Capacity,SMBIOSMemoryType\r\nHOST,8589934592,26\r\nHOST,8589934592,26\r\n";
        let memory = parse_wmic_memory(out);
        assert_eq!(memory.size.as_deref(), Some("16.0 GB"));
        assert_eq!(memory.memory_type.as_deref(), Some("DDR4"));
    }

    #[test]
    fn test_parse_nvidia_smi() {
        let gpu = parse_nvidia_smi("NVIDIA A100-SXM4-40GB, 40960 MiB, 535.54.03\n").unwrap();
        assert_eq!(gpu.model.as_deref(), Some("NVIDIA A100-SXM4-40GB"));
        assert_eq!(gpu.memory.as_deref(), Some("40960 MiB"));
        assert_eq!(gpu.driver_version.as_deref(), Some("535.54.03"));
        assert!(parse_nvidia_smi("\n").is_none());
    }

    #[test]
    fn test_parse_nvidia_smi_keeps_column_positions() {
        let gpu = parse_nvidia_smi("Tesla T4, , 535.54.03\n").unwrap();
        assert_eq!(gpu.model.as_deref(), Some("Tesla T4"));
        assert_eq!(gpu.memory, None);
        assert_eq!(gpu.driver_version.as_deref(), Some("535.54.03"));

        let gpu = parse_nvidia_smi("Tesla T4, 15360 MiB, [N/A]\n").unwrap();
        assert_eq!(gpu.memory.as_deref(), Some("15360 MiB"));
        assert_eq!(gpu.driver_version, None);
        assert!(parse_nvidia_smi(", 15360 MiB, 535.54.03\n").is_none());
    }

    #[test]
    fn test_parse_lscpu_rejects_overflowing_counts() {
        let cpu = parse_lscpu("Core(s) per socket: 4294967295\nSocket(s): 2\n");
        assert_eq!(cpu.cores, None);
    }
}
