// services/tx/category.rs

use crate::infrastructure::provider::ProviderTrait;
use crate::log_warn;
use crate::models::domain::{TransactionCategory, TxParams};
use crate::utils::convert::present;

// ERC-20 函数签名（前4个字节）
const TOKEN_TRANSFER_SIGNATURE: [u8; 4] = [0xa9, 0x05, 0x9c, 0xbb];
const TOKEN_APPROVE_SIGNATURE: [u8; 4] = [0x09, 0x5e, 0xa7, 0xb3];
const TOKEN_TRANSFER_FROM_SIGNATURE: [u8; 4] = [0x23, 0xb8, 0x72, 0xdd];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CategoryResult {
    pub transaction_category: TransactionCategory,
    /// getCode 的原始返回，查询失败或未查询时为 None
    pub get_code_response: Option<String>,
}

/// 按 data 前 4 字节识别代币方法
pub fn token_method(data: &str) -> Option<TransactionCategory> {
    let raw = data.strip_prefix("0x").unwrap_or(data);
    let selector = hex::decode(raw.get(..8)?).ok()?;
    match selector.as_slice() {
        s if s == TOKEN_TRANSFER_SIGNATURE => Some(TransactionCategory::TokenMethodTransfer),
        s if s == TOKEN_APPROVE_SIGNATURE => Some(TransactionCategory::TokenMethodApprove),
        s if s == TOKEN_TRANSFER_FROM_SIGNATURE => {
            Some(TransactionCategory::TokenMethodTransferFrom)
        }
        _ => None,
    }
}

fn code_is_empty(code: Option<&str>) -> bool {
    matches!(code, None | Some("") | Some("0x") | Some("0x0"))
}

/// 判断交易类别，必要时查询接收方代码
pub async fn determine_transaction_category(
    provider: &dyn ProviderTrait,
    params: &TxParams,
) -> CategoryResult {
    let data = present(params.data.as_deref());
    let to = present(params.to.as_deref());

    if let Some(category) = data.and_then(token_method) {
        return CategoryResult {
            transaction_category: category,
            get_code_response: None,
        };
    }

    let Some(to) = to else {
        // 无接收方即合约创建
        return CategoryResult {
            transaction_category: TransactionCategory::DeployContract,
            get_code_response: None,
        };
    };

    let code = match provider.get_code(to).await {
        Ok(code) => Some(code),
        Err(e) => {
            log_warn!("查询地址 {} 的合约代码失败: {}", to, e);
            None
        }
    };

    let transaction_category = if code_is_empty(code.as_deref()) {
        TransactionCategory::SentEther
    } else {
        TransactionCategory::ContractInteraction
    };
    CategoryResult {
        transaction_category,
        get_code_response: code,
    }
}
