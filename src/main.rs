// Copyright 2024 The DocAssert Authors
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
// http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use clap::{Args, Parser, Subcommand};
use serde_json::Value;

use json_patch_assert::assertions::{AssertionError, JsonResponseAssertions};
use json_patch_assert::domain::{HttpMethod, Request};
use json_patch_assert::json_diff::{self, Config, IgnoreRules, NumericMode};
use json_patch_assert::{ApiCall, CallError, Variables};

#[doc(hidden)]
#[derive(Debug, Clone)]
struct JSONVars(Value);

impl FromStr for JSONVars {
    type Err = serde_json::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let value = serde_json::from_str(s)?;
        Ok(JSONVars(value))
    }
}

#[doc(hidden)]
#[macro_export]
macro_rules! handle_error {
    ($code:expr, $msg:expr, $($arg:tt)*) => {
        println!($msg, $($arg)*);
        std::process::exit($code);
    };

    ($code:expr, $msg:expr) => {
        println!($msg);
        std::process::exit($code);
    };
}

#[doc(hidden)]
struct Code;

impl Code {
    const SUCCESS: i32 = 0;
    const INTERNAL_ERROR: i32 = 1;
    const INVALID_ARGUMENT: i32 = 2;
    const FIXTURE_ERROR: i32 = 3;
    const ASSERTION_ERROR: i32 = 4;
}

#[doc(hidden)]
#[derive(Debug, Parser)]
#[command(version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[doc(hidden)]
#[derive(Debug, Subcommand)]
enum Command {
    /// Compare two JSON files and print the patch turning the first into the second
    Diff {
        /// File with the actual document
        actual: PathBuf,

        /// File with the expected document
        expected: PathBuf,

        #[command(flatten)]
        rules: RuleArgs,

        /// Compare numbers by decimal value, so 1 equals 1.0
        #[clap(long)]
        decimal_numbers: bool,

        /// Report object members that only changed place as moves
        #[clap(long)]
        member_moves: bool,
    },
    /// Send one request and assert its response
    Check {
        /// URL to request
        #[clap(short, long)]
        url: String,

        /// HTTP method
        #[clap(short, long, default_value = "GET")]
        method: HttpMethod,

        /// Expected status code
        #[clap(short, long, default_value_t = 200)]
        status: u16,

        /// Expected body, a resource reference such as file:expected.json
        #[clap(short, long)]
        expected: String,

        /// Variables for the expected body template in the JSON object format
        #[clap(short, long)]
        variables: Option<JSONVars>,

        #[command(flatten)]
        rules: RuleArgs,
    },
}

#[doc(hidden)]
#[derive(Debug, Args)]
struct RuleArgs {
    /// JSON pointer whose value is not compared, may be repeated
    #[clap(long = "ignore-value")]
    ignore_value: Vec<String>,

    /// JSON pointer of an array whose order is not compared, may be repeated
    #[clap(long = "ignore-order")]
    ignore_order: Vec<String>,
}

impl RuleArgs {
    fn rules(&self) -> IgnoreRules {
        let rules = IgnoreRules::new()
            .ignore_values_for(&self.ignore_value)
            .and_then(|rules| rules.ignore_order_for(&self.ignore_order));
        match rules {
            Ok(rules) => rules,
            Err(e) => {
                handle_error!(Code::FIXTURE_ERROR, "Error: {}", e);
            }
        }
    }
}

#[doc(hidden)]
fn read_document(path: &Path) -> Value {
    let text = match fs::read_to_string(path) {
        Ok(text) => text,
        Err(e) => {
            handle_error!(Code::FIXTURE_ERROR, "Error reading {}: {}", path.display(), e);
        }
    };
    match json_diff::parse(&text) {
        Ok(value) => value,
        Err(e) => {
            handle_error!(Code::FIXTURE_ERROR, "Error parsing {}: {}", path.display(), e);
        }
    }
}

#[doc(hidden)]
#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    match cli.command {
        Command::Diff {
            actual,
            expected,
            rules,
            decimal_numbers,
            member_moves,
        } => {
            let numeric_mode = if decimal_numbers {
                NumericMode::Decimal
            } else {
                NumericMode::Exact
            };
            let config = Config::new()
                .rules(rules.rules())
                .numeric_mode(numeric_mode)
                .member_moves(member_moves);

            let (actual, expected) = (read_document(&actual), read_document(&expected));
            let operations = json_diff::diff(&actual, &expected, &config);
            match json_diff::report(operations) {
                Ok(()) => {
                    println!("[]");
                    std::process::exit(Code::SUCCESS);
                }
                Err(mismatch) => {
                    handle_error!(Code::ASSERTION_ERROR, "{}", mismatch.patch());
                }
            }
        }
        Command::Check {
            url,
            method,
            status,
            expected,
            variables,
            rules,
        } => {
            let variables = match variables {
                Some(vars) => match Variables::from_json(&vars.0) {
                    Ok(vars) => vars,
                    Err(e) => {
                        handle_error!(Code::INVALID_ARGUMENT, "Error: {}", e);
                    }
                },
                None => Variables::new(),
            };

            let assertions = if variables.is_empty() {
                JsonResponseAssertions::from_resource(status, &expected)
            } else {
                JsonResponseAssertions::from_template(status, &expected, &variables)
            };
            let assertions = match assertions {
                Ok(assertions) => assertions.ignore_rules(rules.rules()),
                Err(e) => {
                    handle_error!(Code::FIXTURE_ERROR, "Error: {}", e);
                }
            };

            let call = ApiCall::new(Request::new(method, url)).with_assertions(assertions);
            match call.call().await {
                Ok(_) => {
                    println!("{} ✅", call.name());
                    std::process::exit(Code::SUCCESS);
                }
                Err(CallError::Transport { source, .. }) => {
                    handle_error!(Code::INTERNAL_ERROR, "{} ❌\n{}", call.name(), source);
                }
                Err(CallError::Assertion { source, .. }) => {
                    let code = match source {
                        AssertionError::Fixture(_) => Code::FIXTURE_ERROR,
                        _ => Code::ASSERTION_ERROR,
                    };
                    handle_error!(code, "{} ❌\n{}", call.name(), source);
                }
            }
        }
    }
}
