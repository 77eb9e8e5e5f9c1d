//! 차트 패턴 타입.
//!
//! 분류 모델은 패턴 종류만 출력하며, 방향은 고정된 정적 테이블로 결정됩니다.
//! 클래스 순서는 모델 학습 시의 순서와 정확히 일치해야 합니다.

use serde::{Deserialize, Serialize};
use std::fmt;

/// 신호 방향.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    /// 상승
    Bullish,
    /// 하락
    Bearish,
    /// 중립
    Neutral,
}

impl Direction {
    /// 점수 집계용 승수 (bullish=+1, bearish=-1, neutral=0).
    pub fn multiplier(&self) -> f64 {
        match self {
            Direction::Bullish => 1.0,
            Direction::Bearish => -1.0,
            Direction::Neutral => 0.0,
        }
    }

    /// 연속 값과 두 임계값으로 방향을 분류합니다.
    ///
    /// 임계값과 정확히 같은 값은 `Neutral`입니다.
    pub fn classify(value: f64, positive: f64, negative: f64) -> Self {
        if value > positive {
            Direction::Bullish
        } else if value < negative {
            Direction::Bearish
        } else {
            Direction::Neutral
        }
    }

    /// 소문자 문자열 표현.
    pub fn as_str(&self) -> &'static str {
        match self {
            Direction::Bullish => "bullish",
            Direction::Bearish => "bearish",
            Direction::Neutral => "neutral",
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 분류 모델이 인식하는 패턴 종류.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PatternKind {
    HeadAndShoulders,
    DoubleTop,
    DoubleBottom,
    AscendingTriangle,
    DescendingTriangle,
    CupAndHandle,
    BullishFlag,
    BearishFlag,
    SupportResistance,
    Breakout,
    /// 감지된 패턴 없음 (모델 미사용 시 대체값)
    NoPattern,
}

impl PatternKind {
    /// 모델 출력 인덱스 순서의 클래스 테이블.
    pub const CLASSES: [PatternKind; 10] = [
        PatternKind::HeadAndShoulders,
        PatternKind::DoubleTop,
        PatternKind::DoubleBottom,
        PatternKind::AscendingTriangle,
        PatternKind::DescendingTriangle,
        PatternKind::CupAndHandle,
        PatternKind::BullishFlag,
        PatternKind::BearishFlag,
        PatternKind::SupportResistance,
        PatternKind::Breakout,
    ];

    /// 모델 클래스 개수.
    pub const fn class_count() -> usize {
        Self::CLASSES.len()
    }

    /// 모델 출력 인덱스에서 패턴 종류를 찾습니다.
    pub fn from_class_index(index: usize) -> Option<Self> {
        Self::CLASSES.get(index).copied()
    }

    /// 모델 출력 인덱스. `NoPattern`은 인덱스가 없습니다.
    pub fn class_index(&self) -> Option<usize> {
        Self::CLASSES.iter().position(|k| k == self)
    }

    /// 패턴 종류에서 방향을 결정하는 고정 테이블.
    pub fn direction(&self) -> Direction {
        match self {
            PatternKind::AscendingTriangle
            | PatternKind::CupAndHandle
            | PatternKind::BullishFlag
            | PatternKind::Breakout => Direction::Bullish,
            PatternKind::DescendingTriangle
            | PatternKind::DoubleTop
            | PatternKind::HeadAndShoulders
            | PatternKind::BearishFlag => Direction::Bearish,
            PatternKind::DoubleBottom | PatternKind::SupportResistance | PatternKind::NoPattern => {
                Direction::Neutral
            }
        }
    }

    /// snake_case 이름.
    pub fn as_str(&self) -> &'static str {
        match self {
            PatternKind::HeadAndShoulders => "head_and_shoulders",
            PatternKind::DoubleTop => "double_top",
            PatternKind::DoubleBottom => "double_bottom",
            PatternKind::AscendingTriangle => "ascending_triangle",
            PatternKind::DescendingTriangle => "descending_triangle",
            PatternKind::CupAndHandle => "cup_and_handle",
            PatternKind::BullishFlag => "bullish_flag",
            PatternKind::BearishFlag => "bearish_flag",
            PatternKind::SupportResistance => "support_resistance",
            PatternKind::Breakout => "breakout",
            PatternKind::NoPattern => "no_pattern",
        }
    }
}

impl fmt::Display for PatternKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 차트 픽셀 좌표계의 패턴 영역.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PatternRegion {
    pub x1: u32,
    pub y1: u32,
    pub x2: u32,
    pub y2: u32,
}

impl PatternRegion {
    pub fn new(x1: u32, y1: u32, x2: u32, y2: u32) -> Self {
        Self { x1, y1, x2, y2 }
    }

    /// 캔버스 전체 영역.
    pub fn full(width: u32, height: u32) -> Self {
        Self::new(0, 0, width, height)
    }
}

/// 단일 패턴 감지 결과.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PatternDetection {
    /// 패턴 종류
    #[serde(rename = "type")]
    pub kind: PatternKind,
    /// 신뢰도 (0.0 ~ 1.0)
    pub confidence: f64,
    /// 패턴 종류에서 파생된 방향
    pub direction: Direction,
    /// 클래스별 원시 점수 (모델 출력 순서)
    #[serde(default)]
    pub raw_scores: Vec<f64>,
    /// 차트 상의 패턴 영역
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub region: Option<PatternRegion>,
}

impl PatternDetection {
    /// 새 감지 결과를 생성합니다. 방향은 패턴 테이블에서 결정됩니다.
    pub fn new(kind: PatternKind, confidence: f64, raw_scores: Vec<f64>) -> Self {
        let confidence = if confidence.is_finite() {
            confidence.clamp(0.0, 1.0)
        } else {
            0.0
        };
        Self {
            kind,
            confidence,
            direction: kind.direction(),
            raw_scores,
            region: None,
        }
    }

    /// 패턴 영역을 설정합니다.
    pub fn with_region(mut self, region: PatternRegion) -> Self {
        self.region = Some(region);
        self
    }

    /// 모델을 사용할 수 없을 때의 대체 감지 결과 (no_pattern / neutral / 0).
    pub fn no_pattern() -> Self {
        Self::new(PatternKind::NoPattern, 0.0, Vec::new())
    }

    /// 방향 승수와 신뢰도의 곱.
    pub fn signed_confidence(&self) -> f64 {
        self.direction.multiplier() * self.confidence
    }
}
