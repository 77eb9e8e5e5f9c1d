//! 심볼 정의.
//!
//! 분석 대상 심볼은 거래소 형식의 단일 문자열(예: `BTCUSDT`)입니다.
//! 심볼은 저장소 키와 차트 경로에 그대로 들어가므로 생성 시점에 검증합니다.

use crate::error::{CoreError, CoreResult};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// 심볼 최대 길이.
pub const MAX_SYMBOL_LEN: usize = 20;

/// 검증된 거래 심볼.
///
/// ASCII 영숫자와 `-`, `_`, `.`만 허용하며 대문자로 정규화됩니다.
/// 영숫자가 하나 이상 있어야 합니다 (`.`, `..` 같은 경로 성분 거부).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Symbol(String);

impl Symbol {
    /// 문자열에서 심볼을 파싱합니다.
    pub fn parse(raw: &str) -> CoreResult<Self> {
        let trimmed = raw.trim();

        if trimmed.is_empty() {
            return Err(CoreError::InvalidSymbol("empty symbol".to_string()));
        }
        if trimmed.len() > MAX_SYMBOL_LEN {
            return Err(CoreError::InvalidSymbol(format!(
                "symbol longer than {} chars: {}",
                MAX_SYMBOL_LEN, trimmed
            )));
        }
        if let Some(c) = trimmed
            .chars()
            .find(|c| !(c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.')))
        {
            return Err(CoreError::InvalidSymbol(format!(
                "unexpected character {:?} in {}",
                c, trimmed
            )));
        }

        if !trimmed.chars().any(|c| c.is_ascii_alphanumeric()) {
            return Err(CoreError::InvalidSymbol(format!(
                "symbol has no alphanumeric characters: {}",
                trimmed
            )));
        }

        Ok(Self(trimmed.to_ascii_uppercase()))
    }

    /// 심볼 문자열을 반환합니다.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for Symbol {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for Symbol {
    type Error = CoreError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<Symbol> for String {
    fn from(symbol: Symbol) -> Self {
        symbol.0
    }
}

impl AsRef<str> for Symbol {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
