mod common;

use common::bullish_row;
use swing_screener::application::signals::classifier::{
    Decision, PolicyPreset, SignalClassifier, SignalInputs, SignalPolicy,
};
use swing_screener::domain::market::fundamentals::Fundamentals;
use swing_screener::domain::screening::types::{BacktestSummary, EnsembleScore, SignalLabel};

fn classify(
    classifier: &SignalClassifier,
    row: &swing_screener::domain::screening::types::FeatureRow,
    probability: f64,
    backtest: Option<BacktestSummary>,
    fundamentals: Option<&Fundamentals>,
) -> Decision {
    let score = EnsembleScore::from_parts(probability, probability, probability);
    classifier.classify(SignalInputs {
        row,
        score: &score,
        backtest: backtest.as_ref(),
        fundamentals,
    })
}

#[test]
fn test_confident_row_with_track_record_is_strong_buy() {
    let classifier = SignalClassifier::default();
    let row = bullish_row();

    let decision = classify(
        &classifier,
        &row,
        0.75,
        Some(BacktestSummary {
            win_rate: 70.0,
            signal_count: 12,
        }),
        None,
    );

    match decision {
        Decision::Signal { label, explanation } => {
            assert_eq!(label, SignalLabel::StrongBuy);
            assert!(!explanation.is_empty());
            assert!(explanation.contains("RSI 50.0"));
            assert!(explanation.contains("win rate 70.0%"));
        }
        other => panic!("expected Strong Buy, got {:?}", other),
    }
}

#[test]
fn test_overbought_rsi_is_excluded_under_every_preset() {
    let mut row = bullish_row();
    row.rsi = 90.0;

    for preset in [PolicyPreset::Relaxed, PolicyPreset::Balanced, PolicyPreset::Strict] {
        let classifier = SignalClassifier::new(SignalPolicy::preset(preset));
        let decision = classify(
            &classifier,
            &row,
            0.95,
            Some(BacktestSummary {
                win_rate: 90.0,
                signal_count: 20,
            }),
            Some(&Fundamentals {
                pe_ratio: Some(20.0),
                eps: Some(3.0),
                revenue_growth: Some(0.1),
                earnings_growth: Some(0.1),
            }),
        );
        match decision {
            Decision::NoSignal { reason } => assert!(reason.contains("RSI 90.0"), "{}", reason),
            other => panic!("{} preset let RSI 90 through: {:?}", preset, other),
        }
    }
}

#[test]
fn test_confident_row_without_backtest_is_buy() {
    let classifier = SignalClassifier::default();
    let decision = classify(&classifier, &bullish_row(), 0.75, None, None);
    assert!(matches!(
        decision,
        Decision::Signal {
            label: SignalLabel::Buy,
            ..
        }
    ));
}

#[test]
fn test_strict_preset_needs_fundamentals() {
    let classifier = SignalClassifier::new(SignalPolicy::preset(PolicyPreset::Strict));
    let backtest = Some(BacktestSummary {
        win_rate: 80.0,
        signal_count: 5,
    });

    let without = classify(&classifier, &bullish_row(), 0.8, backtest, None);
    assert!(matches!(without, Decision::NoSignal { .. }));

    let healthy = Fundamentals {
        pe_ratio: Some(18.0),
        eps: Some(4.2),
        revenue_growth: Some(0.08),
        earnings_growth: Some(0.12),
    };
    let with = classify(&classifier, &bullish_row(), 0.8, backtest, Some(&healthy));
    assert!(matches!(
        with,
        Decision::Signal {
            label: SignalLabel::StrongBuy,
            ..
        }
    ));
}
