//! System statistics readout.
//!
//! Readers favor a degraded value over an error: a missing /proc entry or
//! an unparseable df line shows up as zero on the screen rather than
//! aborting the readout.

use std::{thread, time::Duration};

use anyhow::Result;

use crate::{
    hal::{SystemMetrics, TextScreen, TextStyle},
    render::{Palette, ROW_HEIGHT_PX, SCREEN_HEIGHT_PX, SCREEN_WIDTH_PX},
};

const READOUT_X: i32 = 10;

/// Metrics backed by /proc, /sys and a routing-table probe.
#[cfg(target_os = "linux")]
mod platform {
    use std::{fs, net::UdpSocket, process::Command};

    use crate::hal::SystemMetrics;

    pub struct LinuxMetrics {
        disk_path: String,
    }

    impl LinuxMetrics {
        pub fn new(disk_path: impl Into<String>) -> Self {
            Self {
                disk_path: disk_path.into(),
            }
        }
    }

    impl SystemMetrics for LinuxMetrics {
        fn ip_address(&self) -> String {
            probe_ip().unwrap_or_else(|| "unknown".to_string())
        }

        fn cpu_temp(&self) -> f32 {
            read_temp().unwrap_or(0.0)
        }

        fn cpu_percent(&self) -> f32 {
            read_cpu_percent().unwrap_or(0.0)
        }

        fn ram_percent(&self) -> f32 {
            read_ram_percent().unwrap_or(0.0)
        }

        fn disk_percent(&self) -> f32 {
            read_disk_percent(&self.disk_path).unwrap_or(0.0)
        }
    }

    /// The socket is never written to; connect() alone picks the local
    /// address the kernel would route out of.
    fn probe_ip() -> Option<String> {
        let socket = UdpSocket::bind("0.0.0.0:0").ok()?;
        socket.connect("8.8.8.8:80").ok()?;
        Some(socket.local_addr().ok()?.ip().to_string())
    }

    fn read_temp() -> Option<f32> {
        let raw = fs::read_to_string("/sys/class/thermal/thermal_zone0/temp").ok()?;
        let millidegrees: f32 = raw.trim().parse().ok()?;
        Some(millidegrees / 1000.0)
    }

    fn read_cpu_percent() -> Option<f32> {
        let raw = fs::read_to_string("/proc/loadavg").ok()?;
        let load1min: f32 = raw.split_whitespace().next()?.parse().ok()?;
        let cpu_count = num_cpus::get() as f32;
        Some((load1min / cpu_count * 100.0).min(100.0))
    }

    fn read_ram_percent() -> Option<f32> {
        let meminfo = fs::read_to_string("/proc/meminfo").ok()?;
        let mut total = 0u64;
        let mut available = 0u64;
        for line in meminfo.lines() {
            if line.starts_with("MemTotal:") {
                total = line.split_whitespace().nth(1)?.parse().ok()?;
            } else if line.starts_with("MemAvailable:") {
                available = line.split_whitespace().nth(1)?.parse().ok()?;
            }
        }
        if total == 0 {
            return None;
        }
        Some(total.saturating_sub(available) as f32 / total as f32 * 100.0)
    }

    fn read_disk_percent(path: &str) -> Option<f32> {
        let output = Command::new("df").arg(path).output().ok()?;
        let stdout = String::from_utf8_lossy(&output.stdout);
        let line = stdout.lines().nth(1)?;
        let use_field = line.split_whitespace().nth(4)?;
        use_field.trim_end_matches('%').parse().ok()
    }
}

#[cfg(target_os = "linux")]
pub use platform::LinuxMetrics;

#[cfg(target_os = "linux")]
pub fn platform_metrics(disk_path: &str) -> Box<dyn SystemMetrics> {
    Box::new(LinuxMetrics::new(disk_path))
}

#[cfg(not(target_os = "linux"))]
pub fn platform_metrics(_disk_path: &str) -> Box<dyn SystemMetrics> {
    struct StubMetrics;

    impl SystemMetrics for StubMetrics {
        fn ip_address(&self) -> String {
            "unknown".to_string()
        }
        fn cpu_temp(&self) -> f32 {
            0.0
        }
        fn cpu_percent(&self) -> f32 {
            0.0
        }
        fn ram_percent(&self) -> f32 {
            0.0
        }
        fn disk_percent(&self) -> f32 {
            0.0
        }
    }

    Box::new(StubMetrics)
}

/// Format the readout as fixed-label lines. Labels are padded so the
/// colons line up in the monospace font.
pub fn readout_lines(metrics: &dyn SystemMetrics) -> Vec<String> {
    vec![
        format!("IP address: {}", metrics.ip_address()),
        format!("CPU temp  : {:.1}", metrics.cpu_temp()),
        format!("CPU usage : {:.1} %", metrics.cpu_percent()),
        format!("RAM usage : {:.1} %", metrics.ram_percent()),
        format!("Disk usage: {:.1} %", metrics.disk_percent()),
    ]
}

/// Clear the screen, draw one sample of every metric, and hold it on
/// screen before the caller repaints the menu.
pub fn show_readout(
    screen: &mut dyn TextScreen,
    metrics: &dyn SystemMetrics,
    hold: Duration,
    palette: &Palette,
) -> Result<()> {
    screen.fill_rect(0, 0, SCREEN_WIDTH_PX, SCREEN_HEIGHT_PX, palette.background)?;
    for (i, line) in readout_lines(metrics).iter().enumerate() {
        screen.write_text(
            READOUT_X,
            (i as i32 + 1) * ROW_HEIGHT_PX,
            line,
            TextStyle::Normal,
            palette.text,
            palette.background,
        )?;
    }
    thread::sleep(hold);
    Ok(())
}
