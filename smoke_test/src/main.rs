//! kafka-service smoke suite orchestrator
//!
//! Runs the E2E scenarios in dependency order:
//! 1. Producer tests (delivery reports must work first)
//! 2. Consumer tests (round trips depend on the producer working)
//! 3. Lifecycle tests (shutdown behavior under load)
//!
//! ## Usage
//!
//! ```bash
//! # Against localhost:9092
//! cargo run --release -p smoke_test
//!
//! # Against another cluster
//! KAFKA_BROKERS=kafka1:9092 cargo run --release -p smoke_test
//! ```
//!
//! ## Exit Codes
//!
//! - 0: All scenarios passed
//! - 1: One or more scenarios failed

use smoke_test::{
    test_callback_replacement, test_callback_roundtrip, test_delivery_report_failure,
    test_delivery_report_success, test_flush_on_shutdown, test_reinit_is_noop,
};

/// Suite result tracking
struct SuiteResults {
    passed: usize,
    failed: usize,
    results: Vec<(&'static str, &'static str, bool)>, // (category, name, passed)
}

impl SuiteResults {
    fn new() -> Self {
        Self {
            passed: 0,
            failed: 0,
            results: Vec::new(),
        }
    }

    fn record(&mut self, category: &'static str, name: &'static str, passed: bool) {
        if passed {
            self.passed += 1;
        } else {
            self.failed += 1;
        }
        self.results.push((category, name, passed));
    }

    fn print_summary(&self) {
        println!("\n{}", "=".repeat(60));
        println!("SMOKE SUITE SUMMARY");
        println!("{}\n", "=".repeat(60));

        let mut current_category = "";
        for (category, name, passed) in &self.results {
            if *category != current_category {
                if !current_category.is_empty() {
                    println!();
                }
                println!("{}:", category);
                current_category = category;
            }
            let status = if *passed { "PASSED" } else { "FAILED" };
            println!("  {} - {}", name, status);
        }

        println!("\n{}", "-".repeat(60));
        println!(
            "Total: {} passed, {} failed, {} total",
            self.passed,
            self.failed,
            self.passed + self.failed
        );
    }
}

/// Run a single scenario and record the result
macro_rules! run_test {
    ($results:expr, $category:expr, $name:expr, $test_fn:expr) => {{
        let result = $test_fn.await;
        let passed = result.is_ok();
        if let Err(e) = &result {
            println!("Test failed: {}", e);
        }
        $results.record($category, $name, passed);
        passed
    }};
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    println!("kafka-service smoke suite\n");

    let mut results = SuiteResults::new();

    // ==================== PRODUCER TESTS ====================
    run_test!(
        results,
        "Producer",
        "Delivery Report (success)",
        test_delivery_report_success()
    );
    run_test!(
        results,
        "Producer",
        "Delivery Report (broker error)",
        test_delivery_report_failure()
    );

    // ==================== CONSUMER TESTS ====================
    run_test!(
        results,
        "Consumer",
        "Callback Round Trip",
        test_callback_roundtrip()
    );
    run_test!(
        results,
        "Consumer",
        "Subscription Replacement",
        test_callback_replacement()
    );

    // ==================== LIFECYCLE TESTS ====================
    run_test!(results, "Lifecycle", "Re-init Is a No-op", test_reinit_is_noop());
    run_test!(
        results,
        "Lifecycle",
        "Flush on Shutdown",
        test_flush_on_shutdown()
    );

    results.print_summary();

    if results.failed > 0 {
        std::process::exit(1);
    }

    Ok(())
}
