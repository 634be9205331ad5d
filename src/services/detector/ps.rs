use crate::error::{BongoError, Result};
use crate::events::GameProcessInfo;
use std::process::Command;
use tracing::debug;

pub struct PsProbe;

impl PsProbe {
    pub fn new() -> Self {
        Self
    }

    pub async fn test(&self) -> Result<()> {
        let output = Command::new("ps").args(["-eo", "pid=,comm="]).output()?;
        if output.status.success() {
            Ok(())
        } else {
            Err(BongoError::Internal("ps failed".to_string()))
        }
    }

    pub async fn list_processes(&self) -> Result<Vec<GameProcessInfo>> {
        debug!("Попытка получить список процессов через ps");
        let output = Command::new("ps")
            .args(["-eo", "pid=,comm="])
            .output()
            .map_err(|e| BongoError::Internal(format!("ps не найден: {}", e)))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(BongoError::Internal(format!("ps вернул ошибку: {}", stderr)));
        }

        let stdout = String::from_utf8_lossy(&output.stdout);

        let mut processes = Vec::new();
        for line in stdout.lines() {
            let trimmed = line.trim();
            if let Some((pid_str, name)) = trimmed.split_once(char::is_whitespace) {
                if let Ok(pid) = pid_str.trim().parse::<i32>() {
                    processes.push(GameProcessInfo::new(pid, name.trim().to_string()));
                }
            }
        }

        debug!("ps вернул {} процессов", processes.len());
        Ok(processes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_list_processes_contains_self() {
        let probe = PsProbe::new();
        if probe.test().await.is_err() {
            return; // среда без ps
        }

        let processes = probe.list_processes().await.unwrap();
        assert!(!processes.is_empty());
        assert!(processes.iter().all(|p| p.pid > 0));
    }
}
