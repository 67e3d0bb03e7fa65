use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

/// 協作式取消旗標
///
/// 只在安全點（場景之間、影片之間）被檢查，進行中的編碼不會被打斷。
#[derive(Debug, Clone, Default)]
pub struct CancelFlag(Arc<AtomicBool>);

impl CancelFlag {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }

    /// 開始新的批次前清除上一次的中斷
    pub fn reset(&self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

#[must_use]
pub fn setup_shutdown_signal() -> CancelFlag {
    let shutdown_signal = CancelFlag::new();
    let signal_clone = shutdown_signal.clone();

    ctrlc::set_handler(move || {
        signal_clone.cancel();
        eprintln!("\n收到中斷信號，目前場景完成後停止...");
    })
    .expect("無法設定 Ctrl-C 處理器");

    shutdown_signal
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cancel_flag_shared_between_clones() {
        let flag = CancelFlag::new();
        let worker_view = flag.clone();
        assert!(!worker_view.is_cancelled());

        flag.cancel();
        assert!(worker_view.is_cancelled());

        flag.reset();
        assert!(!worker_view.is_cancelled());
    }
}
