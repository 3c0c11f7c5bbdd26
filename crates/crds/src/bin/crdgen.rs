//! Prints the Provisioning CustomResourceDefinition as YAML.
//!
//! `cargo run -p crds --bin crdgen > config/crd/provisioning.yaml`

use anyhow::Context;
use crds::Provisioning;
use kube::CustomResourceExt;

fn main() -> anyhow::Result<()> {
    let yaml = serde_yaml::to_string(&Provisioning::crd()).context("Failed to serialize Provisioning CRD")?;
    print!("{yaml}");
    Ok(())
}
