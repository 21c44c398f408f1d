//! 타임프레임별 신호 생성기.
//!
//! 하나의 (심볼, 타임프레임) 캔들 시계열에서 지표 판독값과 패턴을 모아
//! 가중 투표로 방향과 신뢰도를 정하고, ATR 기반 손절/목표가를 계산합니다.
//!
//! # 처리 순서
//!
//! 1. 캔들 검증, 현재가 검사
//! 2. 진행 중 캔들 제외 후 신선도 검사
//! 3. 최소 캔들 수 검사 (EMA 200처럼 창이 더 긴 지표는 건너뜀)
//! 4. 분류별 판독값 수집
//! 5. 방향/신뢰도 결정
//! 6. 손절/목표가와 손익비
//!
//! 같은 입력에 대해 항상 같은 신호를 반환합니다.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use signal_core::{
    Candle, CandleSeries, Direction, GeneratorConfig, IndicatorCategory, IndicatorReading,
    IndicatorVote, PatternFormation, SignalError, SignalResult, SignalStrength, TimeframeSignal,
    MIN_CORE_CANDLES,
};
use tracing::{debug, info};

use crate::indicators::{
    last_value, AdxParams, AdxResult, AtrParams, BollingerBandsParams, CrossKind, EmaParams,
    IndicatorEngine, MacdParams, RsiParams, StochasticParams, SwingTrend, VolumeRatioParams,
};
use crate::patterns::{
    support_resistance, CandlestickDetector, DivergenceDetector, LevelParams, Oscillator,
};
use crate::scoring::ConfidenceScorer;
use crate::series_window::SeriesWindow;

/// 선택 지표 EMA 기간.
const LONG_EMA_PERIOD: usize = 200;
/// 교차를 유효하게 보는 최근 캔들 수.
const CROSS_LOOKBACK: usize = 5;
/// OBV 기울기 측정 구간.
const OBV_LOOKBACK: usize = 10;
/// 피보나치 스윙을 찾는 구간.
const FIB_LOOKBACK: usize = 50;
/// 다이버전스를 신호에 반영하는 최근 캔들 수.
const PATTERN_RECENCY: usize = 10;
/// 거래량 급증 기준 배수.
const VOLUME_SURGE: Decimal = dec!(1.5);

/// 타임프레임별 신호 생성기.
#[derive(Debug, Clone)]
pub struct SignalGenerator {
    config: GeneratorConfig,
    engine: IndicatorEngine,
    candlestick: CandlestickDetector,
    divergence: DivergenceDetector,
    scorer: ConfidenceScorer,
    levels: LevelParams,
}

impl Default for SignalGenerator {
    fn default() -> Self {
        Self::new(GeneratorConfig::default())
    }
}

impl SignalGenerator {
    /// 새 생성기를 생성합니다.
    pub fn new(config: GeneratorConfig) -> Self {
        Self {
            scorer: ConfidenceScorer::from_config(&config),
            config,
            engine: IndicatorEngine::new(),
            candlestick: CandlestickDetector::default(),
            divergence: DivergenceDetector::default(),
            levels: LevelParams::default(),
        }
    }

    pub fn config(&self) -> &GeneratorConfig {
        &self.config
    }

    /// 핵심 지표 묶음에 필요한 캔들 수.
    pub fn required_candles(&self) -> usize {
        self.config.min_candles.max(MIN_CORE_CANDLES)
    }

    /// 캔들 시계열에서 신호를 생성합니다.
    ///
    /// # 인자
    /// * `series` - 캔들 시계열 (마지막 캔들은 진행 중일 수 있음)
    /// * `current_price` - 현재가 (진입가로 사용)
    /// * `now` - 기준 시각
    ///
    /// # 오류
    /// - `InvalidCandle`: OHLCV 불변식 위반 또는 시간 역전
    /// - `StaleData`: 마지막 완성 캔들이 허용 범위보다 오래됨
    /// - `InsufficientData`: 완성 캔들 수 부족
    /// - `DegenerateRisk`: 손절 거리가 0 또는 반대편
    pub fn generate(
        &self,
        series: &CandleSeries,
        current_price: Decimal,
        now: DateTime<Utc>,
    ) -> SignalResult<TimeframeSignal> {
        series.validate()?;
        if current_price <= Decimal::ZERO {
            return Err(SignalError::InvalidInput(format!(
                "현재가는 0보다 커야 합니다: {}",
                current_price
            )));
        }

        let timeframe = series.timeframe;
        let candles = SeriesWindow::completed_candles(&series.candles, timeframe, now);
        let required = self.required_candles();
        let Some(last) = candles.last() else {
            return Err(SignalError::InsufficientData {
                required,
                provided: 0,
            });
        };

        let threshold = timeframe
            .span(self.config.stale_after_candles)
            .and_then(|allowance| now.checked_sub_signed(allowance))
            .ok_or_else(|| {
                SignalError::Config(format!(
                    "generator.stale_after_candles가 너무 큽니다: {}",
                    self.config.stale_after_candles
                ))
            })?;
        if last.close_time(timeframe) < threshold {
            return Err(SignalError::StaleData {
                last_candle: last.open_time,
                threshold,
            });
        }

        if candles.len() < required {
            return Err(SignalError::InsufficientData {
                required,
                provided: candles.len(),
            });
        }

        let columns = Columns::from_candles(candles);

        let mut readings = Vec::new();
        let adx = self.trend_readings(&columns, current_price, &mut readings)?;
        let rsi_series = self.momentum_readings(&columns, &mut readings)?;
        let atr = self.volatility_readings(&columns, current_price, &mut readings)?;
        self.volume_readings(&columns, candles, &mut readings)?;
        let patterns = self.detect_patterns(candles, &columns, &rsi_series)?;
        readings.extend(patterns.iter().map(pattern_reading));

        let scored = self.scorer.score(&readings);
        let direction = scored.direction;

        let (stop_loss, take_profit, risk_reward_ratio) = match direction {
            Direction::Neutral => (None, None, None),
            Direction::Long | Direction::Short => {
                let (stop, target) = self.stop_and_target(direction, current_price, atr, adx)?;
                let ratio = risk_reward(direction, current_price, stop, target)?;
                (Some(stop), Some(target), Some(ratio.round_dp(2)))
            }
        };

        let levels = support_resistance(candles, current_price, self.levels);

        info!(
            symbol = %series.symbol,
            timeframe = %timeframe,
            direction = %direction,
            confidence = %scored.confidence,
            net = %scored.net.round_dp(4),
            readings = readings.len(),
            patterns = patterns.len(),
            "신호 생성"
        );

        Ok(TimeframeSignal {
            symbol: series.symbol.clone(),
            timeframe,
            direction,
            confidence: scored.confidence,
            entry_price: current_price,
            stop_loss,
            take_profit,
            risk_reward_ratio,
            atr,
            indicators: readings,
            patterns,
            support_levels: levels.support,
            resistance_levels: levels.resistance,
            timestamp: now,
            last_candle_time: last.open_time,
        })
    }

    // ==================== 추세 ====================

    /// EMA 배열, EMA 교차, EMA 200, MACD, ADX, 피보나치.
    ///
    /// # 반환
    /// 마지막 ADX 값 (손절 배수 결정용)
    fn trend_readings(
        &self,
        columns: &Columns,
        price: Decimal,
        readings: &mut Vec<IndicatorReading>,
    ) -> SignalResult<Option<AdxResult>> {
        let ema20 = self.engine.ema(&columns.closes, EmaParams { period: 20 })?;
        let ema50 = self.engine.ema(&columns.closes, EmaParams { period: 50 })?;

        if let (Some(fast), Some(slow)) = (last_value(&ema20), last_value(&ema50)) {
            let (vote, strength, detail) = if price > fast && fast > slow {
                (IndicatorVote::Buy, SignalStrength::Strong, "가격 > EMA20 > EMA50 정배열")
            } else if price < fast && fast < slow {
                (IndicatorVote::Sell, SignalStrength::Strong, "가격 < EMA20 < EMA50 역배열")
            } else if fast > slow {
                (IndicatorVote::Buy, SignalStrength::Weak, "EMA20 > EMA50, 가격 이탈")
            } else if fast < slow {
                (IndicatorVote::Sell, SignalStrength::Weak, "EMA20 < EMA50, 가격 회복")
            } else {
                (IndicatorVote::Neutral, SignalStrength::Weak, "EMA20 = EMA50")
            };
            readings.push(IndicatorReading::new(
                "EMA(20/50)",
                IndicatorCategory::Trend,
                fast.round_dp(8),
                vote,
                strength,
                detail,
            ));
        }

        if let Some((kind, ago)) = self.engine.last_cross(&ema20, &ema50, CROSS_LOOKBACK) {
            let (vote, label) = match kind {
                CrossKind::Golden => (IndicatorVote::Buy, "골든 크로스"),
                CrossKind::Dead => (IndicatorVote::Sell, "데드 크로스"),
            };
            readings.push(IndicatorReading::new(
                "EMA Cross(20/50)",
                IndicatorCategory::Trend,
                Decimal::from(ago),
                vote,
                SignalStrength::Moderate,
                format!("{} ({}캔들 전)", label, ago),
            ));
        }

        if columns.closes.len() >= LONG_EMA_PERIOD {
            let ema200 = self.engine.ema(
                &columns.closes,
                EmaParams {
                    period: LONG_EMA_PERIOD,
                },
            )?;
            if let Some(long) = last_value(&ema200) {
                let vote = if price > long {
                    IndicatorVote::Buy
                } else if price < long {
                    IndicatorVote::Sell
                } else {
                    IndicatorVote::Neutral
                };
                readings.push(IndicatorReading::new(
                    "EMA(200)",
                    IndicatorCategory::Trend,
                    long.round_dp(8),
                    vote,
                    SignalStrength::Moderate,
                    format!("가격 {} / EMA200 {}", price, long.round_dp(2)),
                ));
            }
        } else {
            debug!(
                provided = columns.closes.len(),
                required = LONG_EMA_PERIOD,
                "EMA(200) 건너뜀"
            );
        }

        let macd = self.engine.macd(&columns.closes, MacdParams::default())?;
        if let Some(last) = macd.last() {
            if let (Some(line), Some(histogram)) = (last.macd, last.histogram) {
                let (vote, strength) = if histogram > Decimal::ZERO {
                    let strength = if line > Decimal::ZERO {
                        SignalStrength::Strong
                    } else {
                        SignalStrength::Moderate
                    };
                    (IndicatorVote::Buy, strength)
                } else if histogram < Decimal::ZERO {
                    let strength = if line < Decimal::ZERO {
                        SignalStrength::Strong
                    } else {
                        SignalStrength::Moderate
                    };
                    (IndicatorVote::Sell, strength)
                } else {
                    (IndicatorVote::Neutral, SignalStrength::Weak)
                };
                readings.push(IndicatorReading::new(
                    "MACD(12,26,9)",
                    IndicatorCategory::Trend,
                    histogram.round_dp(8),
                    vote,
                    strength,
                    format!("MACD {}, 히스토그램 {}", line.round_dp(4), histogram.round_dp(4)),
                ));
            }
        }

        let adx_series = self.engine.adx(
            &columns.highs,
            &columns.lows,
            &columns.closes,
            AdxParams::default(),
        )?;
        let adx = last_value(&adx_series);
        if let Some(AdxResult {
            plus_di,
            minus_di,
            adx: Some(strength_value),
        }) = adx
        {
            let di_vote = if plus_di > minus_di {
                IndicatorVote::Buy
            } else if minus_di > plus_di {
                IndicatorVote::Sell
            } else {
                IndicatorVote::Neutral
            };
            let (vote, strength) = if strength_value >= self.config.strong_trend_adx {
                (di_vote, SignalStrength::Strong)
            } else if strength_value >= dec!(20) {
                (di_vote, SignalStrength::Moderate)
            } else {
                (IndicatorVote::Neutral, SignalStrength::Weak)
            };
            readings.push(IndicatorReading::new(
                "ADX(14)",
                IndicatorCategory::Trend,
                strength_value.round_dp(2),
                vote,
                strength,
                format!(
                    "ADX {}, +DI {}, -DI {}",
                    strength_value.round_dp(2),
                    plus_di.round_dp(2),
                    minus_di.round_dp(2)
                ),
            ));
        }

        if let Some(reading) = self.fibonacci_reading(columns, price) {
            readings.push(reading);
        }

        Ok(adx)
    }

    /// 최근 구간의 스윙에 대한 피보나치 위치.
    ///
    /// 상승 구간에서 61.8% 되돌림 위를 지키면 매수, 78.6% 아래로 무너지면 매도.
    /// 하락 구간은 반대입니다.
    fn fibonacci_reading(&self, columns: &Columns, price: Decimal) -> Option<IndicatorReading> {
        let from = columns.highs.len().saturating_sub(FIB_LOOKBACK);
        let (high_idx, high) = columns.highs[from..]
            .iter()
            .copied()
            .enumerate()
            .max_by_key(|(_, h)| *h)?;
        let (low_idx, low) = columns.lows[from..]
            .iter()
            .copied()
            .enumerate()
            .min_by_key(|(_, l)| *l)?;
        let trend = if low_idx < high_idx {
            SwingTrend::Up
        } else {
            SwingTrend::Down
        };
        let levels = self.engine.fibonacci(high, low, trend).ok()?;
        let golden = levels.retracement(dec!(61.8))?;
        let deep = levels.retracement(dec!(78.6))?;

        let vote = match trend {
            SwingTrend::Up if price >= golden => IndicatorVote::Buy,
            SwingTrend::Up if price < deep => IndicatorVote::Sell,
            SwingTrend::Down if price <= golden => IndicatorVote::Sell,
            SwingTrend::Down if price > deep => IndicatorVote::Buy,
            _ => IndicatorVote::Neutral,
        };
        let nearest = levels.nearest_retracement(price)?;
        Some(IndicatorReading::new(
            "Fibonacci",
            IndicatorCategory::Trend,
            nearest.ratio,
            vote,
            SignalStrength::Weak,
            format!(
                "{:?} 스윙 {} ~ {}, 가장 가까운 레벨 {}% ({})",
                trend,
                low,
                high,
                nearest.ratio,
                nearest.price.round_dp(2)
            ),
        ))
    }

    // ==================== 모멘텀 ====================

    /// RSI, 스토캐스틱.
    ///
    /// # 반환
    /// 다이버전스 감지에 재사용할 RSI 시계열
    fn momentum_readings(
        &self,
        columns: &Columns,
        readings: &mut Vec<IndicatorReading>,
    ) -> SignalResult<Vec<Option<Decimal>>> {
        let rsi = self.engine.rsi(&columns.closes, RsiParams::default())?;
        if let Some(value) = last_value(&rsi) {
            let (vote, strength, detail) = if value <= dec!(20) {
                (IndicatorVote::Buy, SignalStrength::Strong, "극단적 과매도")
            } else if value <= dec!(30) {
                (IndicatorVote::Buy, SignalStrength::Moderate, "과매도")
            } else if value >= dec!(80) {
                (IndicatorVote::Sell, SignalStrength::Strong, "극단적 과매수")
            } else if value >= dec!(70) {
                (IndicatorVote::Sell, SignalStrength::Moderate, "과매수")
            } else {
                (IndicatorVote::Neutral, SignalStrength::Weak, "중립 구간")
            };
            readings.push(IndicatorReading::new(
                "RSI(14)",
                IndicatorCategory::Momentum,
                value.round_dp(2),
                vote,
                strength,
                detail,
            ));
        }

        let stochastic = self.engine.stochastic(
            &columns.highs,
            &columns.lows,
            &columns.closes,
            StochasticParams::default(),
        )?;
        if let Some(last) = stochastic.last() {
            if let (Some(k), Some(d)) = (last.k, last.d) {
                let (vote, strength) = if k <= dec!(20) {
                    let strength = if k > d {
                        SignalStrength::Moderate
                    } else {
                        SignalStrength::Weak
                    };
                    (IndicatorVote::Buy, strength)
                } else if k >= dec!(80) {
                    let strength = if k < d {
                        SignalStrength::Moderate
                    } else {
                        SignalStrength::Weak
                    };
                    (IndicatorVote::Sell, strength)
                } else {
                    (IndicatorVote::Neutral, SignalStrength::Weak)
                };
                readings.push(IndicatorReading::new(
                    "Stochastic(14,3,3)",
                    IndicatorCategory::Momentum,
                    k.round_dp(2),
                    vote,
                    strength,
                    format!("%K {}, %D {}", k.round_dp(2), d.round_dp(2)),
                ));
            }
        }

        Ok(rsi)
    }

    // ==================== 변동성 ====================

    /// 볼린저 %B, ATR%.
    ///
    /// # 반환
    /// 마지막 ATR (손절/목표 거리 산출용)
    fn volatility_readings(
        &self,
        columns: &Columns,
        price: Decimal,
        readings: &mut Vec<IndicatorReading>,
    ) -> SignalResult<Decimal> {
        let bands = self
            .engine
            .bollinger_bands(&columns.closes, BollingerBandsParams::default())?;
        if let Some(band) = last_value(&bands) {
            let percent_b = band.percent_b;
            let (vote, strength) = if percent_b <= Decimal::ZERO {
                (IndicatorVote::Buy, SignalStrength::Moderate)
            } else if percent_b >= Decimal::ONE {
                (IndicatorVote::Sell, SignalStrength::Moderate)
            } else if percent_b < dec!(0.2) {
                (IndicatorVote::Buy, SignalStrength::Weak)
            } else if percent_b > dec!(0.8) {
                (IndicatorVote::Sell, SignalStrength::Weak)
            } else {
                (IndicatorVote::Neutral, SignalStrength::Weak)
            };
            readings.push(IndicatorReading::new(
                "Bollinger(20,2)",
                IndicatorCategory::Volatility,
                percent_b.round_dp(4),
                vote,
                strength,
                format!(
                    "%B {}, 밴드 {} ~ {}",
                    percent_b.round_dp(2),
                    band.lower.round_dp(2),
                    band.upper.round_dp(2)
                ),
            ));
        }

        let atr_series =
            self.engine
                .atr(&columns.highs, &columns.lows, &columns.closes, AtrParams::default())?;
        let atr = last_value(&atr_series).ok_or(SignalError::InsufficientData {
            required: AtrParams::default().period + 1,
            provided: columns.closes.len(),
        })?;
        let atr_pct = self.engine.atr_percent(atr, price)?;
        readings.push(IndicatorReading::new(
            "ATR%(14)",
            IndicatorCategory::Volatility,
            atr_pct.round_dp(4),
            IndicatorVote::Neutral,
            SignalStrength::Weak,
            format!("ATR {} ({}%)", atr.round_dp(4), atr_pct.round_dp(2)),
        ));

        Ok(atr)
    }

    // ==================== 거래량 ====================

    /// OBV 기울기, 거래량 비율.
    fn volume_readings(
        &self,
        columns: &Columns,
        candles: &[Candle],
        readings: &mut Vec<IndicatorReading>,
    ) -> SignalResult<()> {
        let obv = self.engine.obv(&columns.closes, &columns.volumes)?;
        let slope = self.engine.obv_slope(&obv, OBV_LOOKBACK)?;
        let vote = if slope > Decimal::ZERO {
            IndicatorVote::Buy
        } else if slope < Decimal::ZERO {
            IndicatorVote::Sell
        } else {
            IndicatorVote::Neutral
        };
        readings.push(IndicatorReading::new(
            "OBV",
            IndicatorCategory::Volume,
            slope,
            vote,
            SignalStrength::Moderate,
            format!("최근 {}캔들 OBV 변화 {}", OBV_LOOKBACK, slope),
        ));

        match self
            .engine
            .volume_ratio(&columns.volumes, VolumeRatioParams::default())?
        {
            Some(ratio) => {
                let last_candle = candles.last();
                let vote = match last_candle {
                    Some(c) if ratio >= VOLUME_SURGE && c.is_bullish() => IndicatorVote::Buy,
                    Some(c) if ratio >= VOLUME_SURGE && c.is_bearish() => IndicatorVote::Sell,
                    _ => IndicatorVote::Neutral,
                };
                let strength = if vote == IndicatorVote::Neutral {
                    SignalStrength::Weak
                } else {
                    SignalStrength::Moderate
                };
                readings.push(IndicatorReading::new(
                    "Volume Ratio(20)",
                    IndicatorCategory::Volume,
                    ratio.round_dp(4),
                    vote,
                    strength,
                    format!("평균 대비 {}배", ratio.round_dp(2)),
                ));
            }
            None => debug!("평균 거래량 0, 거래량 비율 건너뜀"),
        }
        Ok(())
    }

    // ==================== 패턴 ====================

    /// 캔들 패턴과 최근 다이버전스.
    fn detect_patterns(
        &self,
        candles: &[Candle],
        columns: &Columns,
        rsi: &[Option<Decimal>],
    ) -> SignalResult<Vec<PatternFormation>> {
        let mut patterns = self.candlestick.detect(candles)?;

        let histogram: Vec<Option<Decimal>> = self
            .engine
            .macd(&columns.closes, MacdParams::default())?
            .iter()
            .map(|m| m.histogram)
            .collect();
        let recent_from = candles.len().saturating_sub(PATTERN_RECENCY);
        let oscillators = [
            (rsi, Oscillator::Rsi),
            (&histogram[..], Oscillator::MacdHistogram),
        ];
        for (series, oscillator) in oscillators {
            patterns.extend(
                self.divergence
                    .detect(candles, series, oscillator)?
                    .into_iter()
                    .filter(|p| p.index >= recent_from),
            );
        }
        Ok(patterns)
    }

    /// 방향과 추세 강도에 따른 손절/목표가.
    ///
    /// ADX가 기준 이상이고 DI가 방향과 일치하면 넓은 배수, 아니면 좁은 배수.
    ///
    /// # 오류
    /// SHORT 목표가가 0 이하로 떨어지면 `DegenerateRisk`
    fn stop_and_target(
        &self,
        direction: Direction,
        entry: Decimal,
        atr: Decimal,
        adx: Option<AdxResult>,
    ) -> SignalResult<(Decimal, Decimal)> {
        let confirmed = adx.is_some_and(|a| {
            let di_agrees = match direction {
                Direction::Long => a.plus_di > a.minus_di,
                Direction::Short => a.minus_di > a.plus_di,
                Direction::Neutral => false,
            };
            di_agrees && a.adx.is_some_and(|v| v >= self.config.strong_trend_adx)
        });
        let (stop_mult, target_mult) = if confirmed {
            (self.config.wide_stop_atr, self.config.wide_target_atr)
        } else {
            (self.config.tight_stop_atr, self.config.tight_target_atr)
        };

        let (stop, target) = match direction {
            Direction::Short => (entry + atr * stop_mult, entry - atr * target_mult),
            _ => (entry - atr * stop_mult, entry + atr * target_mult),
        };
        // ATR이 가격에 비해 너무 크면 가격 범위를 벗어남
        if stop <= Decimal::ZERO || target <= Decimal::ZERO {
            return Err(SignalError::DegenerateRisk { entry, stop });
        }
        Ok((stop, target))
    }
}

/// 손익비 = 목표 거리 / 손절 거리.
///
/// # 오류
/// - `DegenerateRisk`: 손절 거리가 0이거나 손절가가 진입가의 반대편
/// - `InvalidInput`: NEUTRAL 방향 또는 목표가가 반대편
pub fn risk_reward(
    direction: Direction,
    entry: Decimal,
    stop: Decimal,
    target: Decimal,
) -> SignalResult<Decimal> {
    let (risk, reward) = match direction {
        Direction::Long => (entry - stop, target - entry),
        Direction::Short => (stop - entry, entry - target),
        Direction::Neutral => {
            return Err(SignalError::InvalidInput(
                "NEUTRAL 신호에는 손익비가 없습니다".to_string(),
            ))
        }
    };
    if risk <= Decimal::ZERO {
        return Err(SignalError::DegenerateRisk { entry, stop });
    }
    if reward <= Decimal::ZERO {
        return Err(SignalError::InvalidInput(format!(
            "목표가 {}가 진입가 {}의 반대편에 있습니다",
            target, entry
        )));
    }
    Ok(reward / risk)
}

fn pattern_reading(pattern: &PatternFormation) -> IndicatorReading {
    let strength = if pattern.reliability >= dec!(70) {
        SignalStrength::Strong
    } else if pattern.reliability >= dec!(50) {
        SignalStrength::Moderate
    } else {
        SignalStrength::Weak
    };
    IndicatorReading::new(
        pattern.name.clone(),
        IndicatorCategory::Pattern,
        pattern.reliability,
        pattern.bias.as_vote(),
        strength,
        pattern.description.clone(),
    )
}

/// 캔들 열 데이터.
struct Columns {
    highs: Vec<Decimal>,
    lows: Vec<Decimal>,
    closes: Vec<Decimal>,
    volumes: Vec<Decimal>,
}

impl Columns {
    fn from_candles(candles: &[Candle]) -> Self {
        Self {
            highs: candles.iter().map(|c| c.high).collect(),
            lows: candles.iter().map(|c| c.low).collect(),
            closes: candles.iter().map(|c| c.close).collect(),
            volumes: candles.iter().map(|c| c.volume).collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};
    use signal_core::{Symbol, Timeframe};

    fn start() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 2, 1, 0, 0, 0).unwrap()
    }

    /// 1시간봉 상승 시계열.
    fn uptrend(count: usize) -> CandleSeries {
        let candles = (0..count)
            .map(|i| {
                let close = dec!(100) + Decimal::from(i as u64);
                Candle::new(
                    start() + Duration::hours(i as i64),
                    close - dec!(0.5),
                    close + dec!(1),
                    close - dec!(1),
                    close,
                    dec!(10) + Decimal::from(i as u64 % 3),
                )
            })
            .collect();
        CandleSeries::new(Symbol::new("BTC", "USDT"), Timeframe::H1, candles)
    }

    /// 마지막 캔들 종료 1분 후.
    fn just_after(series: &CandleSeries) -> DateTime<Utc> {
        series.candles.last().unwrap().close_time(series.timeframe) + Duration::minutes(1)
    }

    #[test]
    fn test_uptrend_produces_long() {
        let series = uptrend(60);
        let now = just_after(&series);
        let signal = SignalGenerator::default()
            .generate(&series, dec!(159), now)
            .unwrap();

        assert_eq!(signal.direction, Direction::Long);
        assert!(signal.confidence > Decimal::ZERO && signal.confidence <= dec!(100));
        let stop = signal.stop_loss.unwrap();
        let target = signal.take_profit.unwrap();
        assert!(stop < signal.entry_price && signal.entry_price < target);
        assert_eq!(signal.risk_reward_ratio, Some(dec!(1.5)));
        assert_eq!(signal.last_candle_time, series.candles[59].open_time);
        assert!(!signal.indicators.iter().any(|r| r.name == "EMA(200)"));
        assert!(signal.agreeing_readings().count() > 0);
    }

    #[test]
    fn test_insufficient_data() {
        let series = uptrend(49);
        let now = just_after(&series);
        assert_eq!(
            SignalGenerator::default().generate(&series, dec!(148), now),
            Err(SignalError::InsufficientData {
                required: 50,
                provided: 49
            })
        );
    }

    #[test]
    fn test_in_progress_candle_is_ignored() {
        let series = uptrend(51);
        // 마지막 캔들 진행 중
        let now = series.candles[50].open_time + Duration::minutes(10);
        let signal = SignalGenerator::default()
            .generate(&series, dec!(150), now)
            .unwrap();
        assert_eq!(signal.last_candle_time, series.candles[49].open_time);
    }

    #[test]
    fn test_stale_data() {
        let series = uptrend(60);
        let now = just_after(&series) + Duration::hours(4);
        assert!(matches!(
            SignalGenerator::default().generate(&series, dec!(159), now),
            Err(SignalError::StaleData { .. })
        ));
    }

    #[test]
    fn test_non_positive_price_rejected() {
        let series = uptrend(60);
        let now = just_after(&series);
        assert!(matches!(
            SignalGenerator::default().generate(&series, Decimal::ZERO, now),
            Err(SignalError::InvalidInput(_))
        ));
    }

    #[test]
    fn test_generation_is_deterministic() {
        let series = uptrend(80);
        let now = just_after(&series);
        let generator = SignalGenerator::default();
        assert_eq!(
            generator.generate(&series, dec!(179), now),
            generator.generate(&series, dec!(179), now)
        );
    }

    #[test]
    fn test_short_target_below_zero_is_degenerate() {
        let generator = SignalGenerator::default();
        // 목표 = 10 - 8 * 1.8 < 0
        assert_eq!(
            generator.stop_and_target(Direction::Short, dec!(10), dec!(8), None),
            Err(SignalError::DegenerateRisk {
                entry: dec!(10),
                stop: dec!(19.6)
            })
        );
        assert_eq!(
            generator.stop_and_target(Direction::Short, dec!(100), dec!(5), None),
            Ok((dec!(106.0), dec!(91.0)))
        );
    }

    #[test]
    fn test_oversized_stale_allowance_is_config_error() {
        let series = uptrend(60);
        let now = just_after(&series);
        let generator = SignalGenerator::new(GeneratorConfig {
            stale_after_candles: u32::MAX,
            ..GeneratorConfig::default()
        });
        assert!(matches!(
            generator.generate(&series, dec!(159), now),
            Err(SignalError::Config(_))
        ));
    }

    #[test]
    fn test_risk_reward() {
        assert_eq!(
            risk_reward(Direction::Long, dec!(100), dec!(100), dec!(110)),
            Err(SignalError::DegenerateRisk {
                entry: dec!(100),
                stop: dec!(100)
            })
        );
        assert!(matches!(
            risk_reward(Direction::Short, dec!(100), dec!(95), dec!(90)),
            Err(SignalError::DegenerateRisk { .. })
        ));
        assert_eq!(
            risk_reward(Direction::Short, dec!(100), dec!(104), dec!(92)),
            Ok(dec!(2))
        );
        assert!(risk_reward(Direction::Neutral, dec!(100), dec!(95), dec!(110)).is_err());
    }
}
