use std::{future::Future, sync::Arc};

use tokio::sync::watch;

use crate::{Error, Result};

/// Cooperative cancellation signal shared by every worker of one run.
#[derive(Clone, Debug)]
pub struct CancelToken {
	tx: Arc<watch::Sender<bool>>,
	rx: watch::Receiver<bool>,
}
impl CancelToken {
	pub fn new() -> Self {
		let (tx, rx) = watch::channel(false);

		Self { tx: Arc::new(tx), rx }
	}

	pub fn cancel(&self) {
		self.tx.send_replace(true);
	}

	pub fn is_cancelled(&self) -> bool {
		*self.rx.borrow()
	}

	pub fn check(&self) -> Result<()> {
		if self.is_cancelled() {
			return Err(Error::Cancelled);
		}

		Ok(())
	}

	/// Resolves once `cancel` has been called on any clone.
	pub async fn cancelled(&self) {
		let mut rx = self.rx.clone();

		// The sender lives inside the token, so the channel cannot close while `self` exists.
		let _ = rx.wait_for(|cancelled| *cancelled).await;
	}

	/// Runs `fut` unless cancellation arrives first.
	pub async fn run<F, T>(&self, fut: F) -> Result<T>
	where
		F: Future<Output = T>,
	{
		tokio::select! {
			biased;
			_ = self.cancelled() => Err(Error::Cancelled),
			out = fut => Ok(out),
		}
	}
}

impl Default for CancelToken {
	fn default() -> Self {
		Self::new()
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[tokio::test]
	async fn clones_observe_cancellation() {
		let token = CancelToken::new();
		let clone = token.clone();

		assert!(clone.check().is_ok());

		token.cancel();

		assert!(clone.is_cancelled());
		assert!(matches!(clone.check(), Err(Error::Cancelled)));

		clone.cancelled().await;
	}

	#[tokio::test]
	async fn run_yields_to_cancellation() {
		let token = CancelToken::new();

		token.cancel();

		let out = token.run(std::future::pending::<()>()).await;

		assert!(matches!(out, Err(Error::Cancelled)));
	}
}
