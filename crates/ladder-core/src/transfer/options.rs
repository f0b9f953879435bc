//! Curl handle settings shared by HEAD probes and GETs.

use std::time::Duration;

use curl::easy::Easy;

use crate::config::{parse_proxy, LadderConfig};

/// Options applied to every curl handle a transfer creates.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CurlOptions {
    /// Connect deadline and stall window. `None` means no limit at all.
    ///
    /// libcurl measures the stall window in whole seconds, so it is rounded
    /// up to the next second (at least 1 s). The connect deadline keeps
    /// millisecond precision.
    pub timeout: Option<Duration>,
    /// Proxy URL passed to `CURLOPT_PROXY`.
    pub proxy: Option<String>,
    /// Receive cap in bytes per second.
    pub max_recv_speed: Option<u64>,
}

impl CurlOptions {
    /// Build from config. An invalid `global_proxy` is logged and ignored.
    pub fn from_config(cfg: &LadderConfig) -> Self {
        let proxy = cfg
            .global_proxy
            .as_deref()
            .map(str::trim)
            .filter(|p| !p.is_empty())
            .and_then(|raw| match parse_proxy(raw) {
                Ok((host, port)) => Some(format!("http://{}:{}", host, port)),
                Err(e) => {
                    tracing::warn!("ignoring global_proxy: {}", e);
                    None
                }
            });
        Self {
            timeout: (cfg.timeout_ms > 0).then(|| Duration::from_millis(cfg.timeout_ms)),
            proxy,
            max_recv_speed: cfg.max_bytes_per_sec.filter(|&b| b > 0),
        }
    }

    /// Same options without any time limit (self-update and other large files).
    pub fn unbounded(&self) -> Self {
        Self {
            timeout: None,
            ..self.clone()
        }
    }

    /// Options for one strategy call.
    pub(crate) fn for_call(&self, unbounded: bool) -> Self {
        if unbounded {
            self.unbounded()
        } else {
            self.clone()
        }
    }

    /// Stall window handed to `CURLOPT_LOW_SPEED_TIME`, in whole seconds.
    pub(crate) fn stall_window(&self) -> Option<Duration> {
        self.timeout.map(|t| {
            let secs = t.as_secs() + u64::from(t.subsec_nanos() > 0);
            Duration::from_secs(secs.max(1))
        })
    }

    /// Configure `easy` with redirects, deadlines, proxy and speed cap.
    pub(crate) fn apply(&self, easy: &mut Easy) -> Result<(), curl::Error> {
        easy.follow_location(true)?;
        easy.max_redirections(10)?;
        if let Some(timeout) = self.timeout {
            easy.connect_timeout(timeout)?;
        }
        if let Some(window) = self.stall_window() {
            // A body that stops flowing for the window is treated as a timeout.
            easy.low_speed_limit(1)?;
            easy.low_speed_time(window)?;
        }
        if let Some(proxy) = &self.proxy {
            easy.proxy(proxy)?;
        }
        if let Some(speed) = self.max_recv_speed {
            easy.max_recv_speed(speed)?;
        }
        Ok(())
    }
}
