use std::sync::Mutex;

/// Host channel for transient, user-visible notifications.
pub trait Notifier: Send + Sync {
    fn danger(&self, message: &str);
}

impl<F> Notifier for F
where
    F: Fn(&str) + Send + Sync,
{
    fn danger(&self, message: &str) {
        self(message)
    }
}

#[derive(Debug, Default)]
/// Collects notifications so a host can flush them on its own schedule.
pub struct BufferedNotifier {
    messages: Mutex<Vec<String>>,
}

impl BufferedNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn drain(&self) -> Vec<String> {
        std::mem::take(
            &mut *self
                .messages
                .lock()
                .unwrap_or_else(|poisoned| poisoned.into_inner()),
        )
    }
}

impl Notifier for BufferedNotifier {
    fn danger(&self, message: &str) {
        self.messages
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .push(message.to_string());
    }
}
