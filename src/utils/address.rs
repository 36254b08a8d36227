use crate::log_warn;
use ethers_core::types::H160;

/// 账户类型，由地址首字节的高 4 位决定
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AddressType {
    /// 全零地址
    Null,
    /// 0x0 开头：内置合约
    Builtin,
    /// 0x1 开头：普通账户
    User,
    /// 0x8 开头：合约账户
    Contract,
    Unknown,
}

impl AddressType {
    pub fn of(address: &H160) -> Self {
        if address.is_zero() {
            return AddressType::Null;
        }
        match address.as_bytes()[0] >> 4 {
            0x0 => AddressType::Builtin,
            0x1 => AddressType::User,
            0x8 => AddressType::Contract,
            _ => AddressType::Unknown,
        }
    }

    pub fn is_contract(&self) -> bool {
        matches!(self, AddressType::Contract | AddressType::Builtin)
    }
}

/// 判断接收方是否为合约地址；无法解析的地址一律按非合约处理
pub fn is_contract_address(address: &str) -> bool {
    match address.trim().parse::<H160>() {
        Ok(addr) => AddressType::of(&addr).is_contract(),
        Err(_) => {
            log_warn!("无法解析的地址 {}，按非合约地址处理", address);
            false
        }
    }
}
