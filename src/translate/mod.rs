pub mod opus;

pub use opus::OpusTranslator;

use crate::error::Result;
use async_trait::async_trait;

#[async_trait]
pub trait Translator: Send + Sync {
    async fn translate(&self, text: &str) -> Result<String>;
    fn name(&self) -> String;
}
