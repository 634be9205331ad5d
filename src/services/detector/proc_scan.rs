use crate::error::{BongoError, Result};
use crate::events::GameProcessInfo;
use std::fs;
use std::path::Path;
use tracing::debug;

/// Резервный способ перечисления процессов: прямое сканирование /proc.
/// Работает там, где утилита ps отсутствует или урезана.
pub struct ProcScanProbe;

impl ProcScanProbe {
    pub fn new() -> Self {
        Self
    }

    pub async fn test(&self) -> Result<()> {
        match fs::read_dir("/proc") {
            Ok(_) => Ok(()),
            Err(e) => Err(BongoError::Internal(format!("/proc недоступен: {}", e))),
        }
    }

    pub async fn list_processes(&self) -> Result<Vec<GameProcessInfo>> {
        debug!("Сканирование /proc для перечисления процессов");

        let entries = fs::read_dir("/proc")
            .map_err(|e| BongoError::Internal(format!("/proc недоступен: {}", e)))?;

        let mut processes = Vec::new();
        for entry in entries.flatten() {
            let file_name = entry.file_name();
            let Some(name) = file_name.to_str() else {
                continue;
            };

            // Каталоги процессов - только числовые PID
            let Ok(pid) = name.parse::<i32>() else {
                continue;
            };

            // Процесс мог завершиться между read_dir и чтением comm
            if let Some(comm) = Self::read_comm(&entry.path()) {
                processes.push(GameProcessInfo::new(pid, comm));
            }
        }

        debug!("/proc содержит {} процессов", processes.len());
        Ok(processes)
    }

    fn read_comm(proc_dir: &Path) -> Option<String> {
        let comm = fs::read_to_string(proc_dir.join("comm")).ok()?;
        let trimmed = comm.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(trimmed.to_string())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_proc_scan_finds_current_process() {
        let probe = ProcScanProbe::new();
        if probe.test().await.is_err() {
            return; // не-Linux среда
        }

        let processes = probe.list_processes().await.unwrap();
        let own_pid = std::process::id() as i32;
        assert!(processes.iter().any(|p| p.pid == own_pid));
    }
}
