use chrono::NaiveDate;
use ledgerfolio::AppCommand;
use ledgerfolio::core::calendar::{fiscal_year, week_start};
use ledgerfolio::core::ledger::Ledger;
use ledgerfolio::core::{
    AssetId, CurrentValuation, PortfolioSnapshot, PriceOracle, SymbolResolver, replay,
};
use ledgerfolio::providers::coingecko::CoinGeckoProvider;
use std::fs;
use std::path::PathBuf;
use tempfile::TempDir;
use tracing::info;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

mod test_utils {
    use super::*;

    /// CoinGecko stand-in knowing bitcoin and ethereum. Each history and spot
    /// endpoint must be hit exactly once per run.
    pub async fn create_coingecko_mock_server() -> MockServer {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/api/v3/coins/list"))
            .respond_with(ResponseTemplate::new(200).set_body_string(
                r#"[
                    {"id": "bitcoin", "symbol": "btc", "name": "Bitcoin"},
                    {"id": "ethereum", "symbol": "eth", "name": "Ethereum"}
                ]"#,
            ))
            .mount(&mock_server)
            .await;

        // 2021-01-05T00:00:00Z
        Mock::given(method("GET"))
            .and(path("/api/v3/coins/bitcoin/market_chart"))
            .and(query_param("vs_currency", "usd"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_string(r#"{"prices": [[1609804800000, 30000.0]]}"#),
            )
            .expect(1)
            .mount(&mock_server)
            .await;

        // 2021-01-05T00:00:00Z and 2021-06-01T00:00:00Z
        Mock::given(method("GET"))
            .and(path("/api/v3/coins/ethereum/market_chart"))
            .and(query_param("vs_currency", "usd"))
            .respond_with(ResponseTemplate::new(200).set_body_string(
                r#"{"prices": [[1609804800000, 1000.0], [1622505600000, 2500.0]]}"#,
            ))
            .expect(1)
            .mount(&mock_server)
            .await;

        for (id, price) in [("bitcoin", 40000.0), ("ethereum", 3000.0)] {
            Mock::given(method("GET"))
                .and(path("/api/v3/simple/price"))
                .and(query_param("ids", id))
                .respond_with(
                    ResponseTemplate::new(200)
                        .set_body_string(format!(r#"{{"{id}": {{"usd": {price}}}}}"#)),
                )
                .mount(&mock_server)
                .await;
        }

        mock_server
    }

    pub fn write_config(dir: &TempDir, base_url: &str, ledger: Option<&PathBuf>) -> PathBuf {
        let ledger_line = ledger
            .map(|p| format!("ledger: \"{}\"\n", p.display()))
            .unwrap_or_default();
        let config = format!(
            "currency: \"USD\"\n{ledger_line}providers:\n  coingecko:\n    base_url: \"{base_url}\"\n"
        );
        let config_path = dir.path().join("config.yaml");
        fs::write(&config_path, config).expect("Failed to write config");
        config_path
    }

    pub fn write_ledger(dir: &TempDir, rows: &[&str]) -> PathBuf {
        let mut content = String::from("Date,Type,Base amount,Base currency,Costs/Proceeds\n");
        for row in rows {
            content.push_str(row);
            content.push('\n');
        }
        let ledger_path = dir.path().join("ledger.csv");
        fs::write(&ledger_path, content).expect("Failed to write ledger");
        ledger_path
    }
}

const LEDGER_ROWS: &[&str] = &[
    "2021-01-05 10:00:00,BUY,1.0,BTC,30000",
    "2021-01-06 10:00:00,BUY,2.0,ETH,2000",
    "2021-06-02 10:00:00,BUY,0.1,ETH,",
];

#[test_log::test(tokio::test)]
async fn test_summary_flow_with_mock_market() {
    let mock_server = test_utils::create_coingecko_mock_server().await;
    let temp_dir = TempDir::new().unwrap();
    let ledger_path = test_utils::write_ledger(&temp_dir, LEDGER_ROWS);
    let config_path =
        test_utils::write_config(&temp_dir, &mock_server.uri(), Some(&ledger_path));

    info!("Running summary against {}", mock_server.uri());
    let result = ledgerfolio::run_command(
        AppCommand::Summary,
        config_path.to_str(),
        None,
    )
    .await;

    assert!(result.is_ok(), "Summary failed: {:?}", result.err());
}

#[test_log::test(tokio::test)]
async fn test_figures_from_mock_market() {
    let mock_server = test_utils::create_coingecko_mock_server().await;
    let temp_dir = TempDir::new().unwrap();
    let ledger_path = test_utils::write_ledger(&temp_dir, LEDGER_ROWS);
    let ledger = Ledger::load_from_path(&ledger_path).unwrap();

    let provider = CoinGeckoProvider::new(&mock_server.uri(), "usd");
    let oracle = PriceOracle::new(&provider, &provider);
    let resolver = SymbolResolver::new(&provider);
    let now = NaiveDate::from_ymd_opt(2023, 6, 1)
        .unwrap()
        .and_hms_opt(12, 0, 0)
        .unwrap();

    let acc = replay(&ledger, &oracle, &resolver, now).await.unwrap();
    let bitcoin = AssetId::new("bitcoin");
    let ethereum = AssetId::new("ethereum");
    assert_eq!(acc.balance(&bitcoin), 1.0);
    assert!((acc.balance(&ethereum) - 2.1).abs() < 1e-12);

    // BTC buy: 1 * 30000, ETH buy: 1 * 30000 + 2 * 1000
    let january = week_start(
        NaiveDate::from_ymd_opt(2021, 1, 5)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap(),
    );
    assert_eq!(acc.weekly_valuation.get(&january), Some(&62_000.0));
    assert_eq!(acc.invested_sum(), 32_000.0);
    assert!((acc.earned_sum() - 250.0).abs() < 1e-9);

    let current = CurrentValuation::fetch(&acc, &oracle).await.unwrap();
    let snapshot = PortfolioSnapshot::new(acc, current);
    // 1 * 40000 + 2.1 * 3000
    assert!((snapshot.current_valuation_sum() - 46_300.0).abs() < 1e-6);
    let total_pl = snapshot.total_pl().unwrap();
    assert!((total_pl - (46_300.0 / 32_250.0 - 1.0)).abs() < 1e-9);

    // Bitcoin has no June price, so 2021 closes on 2.1 ETH at 2500
    let yearly: Vec<(i32, f64)> = snapshot
        .yearly_valuation()
        .iter()
        .map(|(y, v)| (y.year(), *v))
        .collect();
    assert_eq!(yearly.len(), 1);
    assert_eq!(yearly[0].0, fiscal_year(now).year() - 2);
    assert!((yearly[0].1 - 5_250.0).abs() < 1e-9);

    let cagr = snapshot.cagr(2023).unwrap();
    assert!((cagr - ((46_300.0_f64 / 5_250.0).powf(0.5) - 1.0)).abs() < 1e-9);
    assert_eq!(oracle.outbound_calls(), 4);
}

#[test_log::test(tokio::test)]
async fn test_yearly_and_history_flows() {
    let temp_dir = TempDir::new().unwrap();
    let ledger_path = test_utils::write_ledger(&temp_dir, LEDGER_ROWS);

    for command in [AppCommand::Yearly, AppCommand::History] {
        // Fresh server per run, so each asserts its own fetch-once counts
        let mock_server = test_utils::create_coingecko_mock_server().await;
        let config_path = test_utils::write_config(&temp_dir, &mock_server.uri(), None);

        let result = ledgerfolio::run_command(
            command,
            config_path.to_str(),
            ledger_path.to_str(),
        )
        .await;

        assert!(result.is_ok(), "Command failed: {:?}", result.err());
    }
}

#[test_log::test(tokio::test)]
async fn test_unknown_symbol_aborts() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/v3/coins/list"))
        .respond_with(ResponseTemplate::new(200).set_body_string(
            r#"[{"id": "bitcoin", "symbol": "btc", "name": "Bitcoin"}]"#,
        ))
        .mount(&mock_server)
        .await;

    let temp_dir = TempDir::new().unwrap();
    let ledger_path = test_utils::write_ledger(&temp_dir, &["2021-01-05 10:00:00,BUY,1.0,ZZZ,10"]);
    let config_path =
        test_utils::write_config(&temp_dir, &mock_server.uri(), Some(&ledger_path));

    let result = ledgerfolio::run_command(AppCommand::Summary, config_path.to_str(), None).await;

    let message = result.unwrap_err().to_string();
    assert!(message.contains("Symbol not found"), "Unexpected error: {message}");
}

#[test_log::test(tokio::test)]
async fn test_missing_ledger_is_reported() {
    let temp_dir = TempDir::new().unwrap();
    let config_path = test_utils::write_config(&temp_dir, "http://127.0.0.1:9", None);

    let result = ledgerfolio::run_command(AppCommand::History, config_path.to_str(), None).await;

    assert!(
        result
            .unwrap_err()
            .to_string()
            .contains("No ledger file given")
    );
}

#[test_log::test(tokio::test)]
async fn test_invalid_config_path() {
    let result = ledgerfolio::run_command(
        AppCommand::Summary,
        Some("/nonexistent/ledgerfolio.yaml"),
        None,
    )
    .await;

    assert!(
        result
            .unwrap_err()
            .to_string()
            .contains("Failed to read config file")
    );
}
