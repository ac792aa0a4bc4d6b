use crate::domain::model::{Exchange, FundingRate};
use crate::utils::error::Result;
use async_trait::async_trait;

pub trait Storage: Send + Sync {
    fn read_file(&self, path: &str) -> impl std::future::Future<Output = Result<Vec<u8>>> + Send;
    fn write_file(
        &self,
        path: &str,
        data: &[u8],
    ) -> impl std::future::Future<Output = Result<()>> + Send;
    /// 回傳檔案的完整位置（顯示用）
    fn location(&self, path: &str) -> String;
}

/// 單一交易所的公開資金費率 API
#[async_trait]
pub trait ExchangeClient: Send + Sync {
    fn exchange(&self) -> Exchange;

    /// 取得指定基礎幣種的資金費率；不存在於交易所的幣種直接略過
    async fn fetch_funding_rates(&self, symbols: &[String]) -> Result<Vec<FundingRate>>;
}
