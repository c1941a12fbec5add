//! ABAP Unit run result tree and its reduction to a verdict.
//!
//! The ADT test-run endpoint answers with
//! `runResult > program > testClasses > testClass > testMethods > testMethod > alerts > alert`.
//! A method with at least one alert failed.

use serde::Deserialize;

/// Local name of the run result document's root element.
pub const RUN_RESULT_ROOT: &str = "runResult";

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct RunResult {
    #[serde(rename = "program")]
    pub programs: Vec<Program>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Program {
    #[serde(rename = "@name", alias = "@adtcore:name")]
    pub name: String,
    #[serde(rename = "@uri", alias = "@adtcore:uri")]
    pub uri: String,
    #[serde(rename = "@type", alias = "@adtcore:type")]
    pub kind: String,
    #[serde(rename = "testClasses")]
    pub test_classes: TestClasses,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct TestClasses {
    #[serde(rename = "testClass")]
    pub items: Vec<TestClass>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct TestClass {
    #[serde(rename = "@name", alias = "@adtcore:name")]
    pub name: String,
    #[serde(rename = "@uri", alias = "@adtcore:uri")]
    pub uri: String,
    #[serde(rename = "@riskLevel")]
    pub risk_level: String,
    #[serde(rename = "@durationCategory")]
    pub duration_category: String,
    #[serde(rename = "testMethods")]
    pub test_methods: TestMethods,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct TestMethods {
    #[serde(rename = "testMethod")]
    pub items: Vec<TestMethod>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct TestMethod {
    #[serde(rename = "@name", alias = "@adtcore:name")]
    pub name: String,
    #[serde(rename = "@uri", alias = "@adtcore:uri")]
    pub uri: String,
    #[serde(rename = "@executionTime")]
    pub execution_time: String,
    #[serde(rename = "@unit")]
    pub unit: String,
    pub alerts: Alerts,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Alerts {
    #[serde(rename = "alert")]
    pub items: Vec<Alert>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Alert {
    #[serde(rename = "@kind")]
    pub kind: String,
    #[serde(rename = "@severity")]
    pub severity: String,
    pub title: String,
    pub details: Details,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Details {
    #[serde(rename = "detail")]
    pub items: Vec<Detail>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Detail {
    #[serde(rename = "@text")]
    pub text: String,
    pub details: Option<Details>,
}

/// Outcome of one test method.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MethodOutcome {
    pub program: String,
    pub class: String,
    pub method: String,
    /// Alert titles; empty means the method passed.
    pub alerts: Vec<String>,
}

impl MethodOutcome {
    pub fn passed(&self) -> bool {
        self.alerts.is_empty()
    }
}

/// Verdict for one package run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PackageVerdict {
    pub package: String,
    pub methods: Vec<MethodOutcome>,
}

impl PackageVerdict {
    pub fn failed_methods(&self) -> usize {
        self.methods.iter().filter(|m| !m.passed()).count()
    }

    pub fn passed(&self) -> bool {
        self.failed_methods() == 0
    }
}

impl RunResult {
    /// Visit every program, class and method, in document order.
    ///
    /// All methods are visited even after a failure has been seen.
    pub fn method_outcomes(&self) -> Vec<MethodOutcome> {
        let mut outcomes = Vec::new();
        for program in &self.programs {
            for class in &program.test_classes.items {
                for method in &class.test_methods.items {
                    outcomes.push(MethodOutcome {
                        program: program.name.clone(),
                        class: class.name.clone(),
                        method: method.name.clone(),
                        alerts: method
                            .alerts
                            .items
                            .iter()
                            .map(|alert| alert.title.clone())
                            .collect(),
                    });
                }
            }
        }
        outcomes
    }

    /// Reduce the tree for `package` into a verdict.
    pub fn verdict(&self, package: &str) -> PackageVerdict {
        PackageVerdict {
            package: package.to_string(),
            methods: self.method_outcomes(),
        }
    }
}
