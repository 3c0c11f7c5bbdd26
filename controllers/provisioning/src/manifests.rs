//! Desired manifests for the managed Secret and Deployment.
//!
//! Builders here are pure: they take the configuration, the derived
//! parameters and the owner reference, and return the object to create.

use crate::config::OperatorConfig;
use baremetal_config::DerivedConfig;
use k8s_openapi::api::apps::v1::{Deployment, DeploymentSpec};
use k8s_openapi::api::core::v1::{
    Container, EmptyDirVolumeSource, EnvVar, PodSpec, PodTemplateSpec, Secret, SecretVolumeSource,
    SecurityContext, Volume, VolumeMount,
};
use k8s_openapi::apimachinery::pkg::apis::meta::v1::{LabelSelector, ObjectMeta, OwnerReference};
use rand::Rng;
use rand::distributions::Alphanumeric;
use std::collections::BTreeMap;

pub const MARIADB_SECRET_NAME: &str = "metal3-mariadb-password";
/// Key of the credential inside the Secret.
pub const MARIADB_PASSWORD_KEY: &str = "password";
pub const DEPLOYMENT_NAME: &str = "metal3";

const PASSWORD_LENGTH: usize = 16;
const APP_LABEL_KEY: &str = "k8s-app";
const APP_LABEL_VALUE: &str = "metal3";

const SHARED_VOLUME: &str = "metal3-shared";
const SHARED_MOUNT_PATH: &str = "/shared";
const MARIADB_VOLUME: &str = "metal3-mariadb-password";
const MARIADB_MOUNT_PATH: &str = "/auth/mariadb";

/// Generates a fresh alphanumeric database credential.
pub fn generate_password() -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(PASSWORD_LENGTH)
        .map(char::from)
        .collect()
}

/// Secret holding the ironic database credential.
pub fn mariadb_password_secret(namespace: &str, password: String, owner: OwnerReference) -> Secret {
    Secret {
        metadata: ObjectMeta {
            name: Some(MARIADB_SECRET_NAME.to_string()),
            namespace: Some(namespace.to_string()),
            owner_references: Some(vec![owner]),
            ..Default::default()
        },
        string_data: Some(BTreeMap::from([(MARIADB_PASSWORD_KEY.to_string(), password)])),
        type_: Some("Opaque".to_string()),
        ..Default::default()
    }
}

/// The metal3 Deployment: image downloaders and static IP setup as init
/// containers, then the operator, ironic, inspector and static IP manager.
pub fn metal3_deployment(config: &OperatorConfig, derived: &DerivedConfig, owner: OwnerReference) -> Deployment {
    let images = &config.images;
    let env = env_vars(derived);
    let labels = BTreeMap::from([(APP_LABEL_KEY.to_string(), APP_LABEL_VALUE.to_string())]);

    let shared_mount = VolumeMount {
        name: SHARED_VOLUME.to_string(),
        mount_path: SHARED_MOUNT_PATH.to_string(),
        ..Default::default()
    };
    let container = |name: &str, image: &str, privileged: bool| Container {
        name: name.to_string(),
        image: Some(image.to_string()),
        env: Some(env.clone()),
        volume_mounts: Some(vec![shared_mount.clone()]),
        security_context: privileged.then(|| SecurityContext {
            privileged: Some(true),
            ..Default::default()
        }),
        ..Default::default()
    };

    let init_containers = vec![
        container("metal3-ipa-downloader", &images.ironic_ipa_downloader, true),
        container("metal3-machine-os-downloader", &images.ironic_machine_os_downloader, true),
        container("metal3-static-ip-set", &images.ironic_static_ip_manager, true),
    ];

    let mut ironic = container("metal3-ironic", &images.ironic, true);
    ironic.volume_mounts.get_or_insert_with(Vec::new).push(VolumeMount {
        name: MARIADB_VOLUME.to_string(),
        mount_path: MARIADB_MOUNT_PATH.to_string(),
        read_only: Some(true),
        ..Default::default()
    });

    let containers = vec![
        container("metal3-baremetal-operator", &images.baremetal_operator, false),
        ironic,
        container("metal3-ironic-inspector", &images.ironic_inspector, true),
        container("metal3-static-ip-manager", &images.ironic_static_ip_manager, true),
    ];

    let volumes = vec![
        Volume {
            name: SHARED_VOLUME.to_string(),
            empty_dir: Some(EmptyDirVolumeSource::default()),
            ..Default::default()
        },
        Volume {
            name: MARIADB_VOLUME.to_string(),
            secret: Some(SecretVolumeSource {
                secret_name: Some(MARIADB_SECRET_NAME.to_string()),
                ..Default::default()
            }),
            ..Default::default()
        },
    ];

    Deployment {
        metadata: ObjectMeta {
            name: Some(DEPLOYMENT_NAME.to_string()),
            namespace: Some(config.target_namespace.clone()),
            labels: Some(labels.clone()),
            owner_references: Some(vec![owner]),
            ..Default::default()
        },
        spec: Some(DeploymentSpec {
            replicas: Some(1),
            selector: LabelSelector {
                match_labels: Some(labels.clone()),
                ..Default::default()
            },
            template: PodTemplateSpec {
                metadata: Some(ObjectMeta {
                    labels: Some(labels),
                    ..Default::default()
                }),
                spec: Some(PodSpec {
                    host_network: Some(true),
                    init_containers: Some(init_containers),
                    containers,
                    volumes: Some(volumes),
                    ..Default::default()
                }),
            },
            ..Default::default()
        }),
        ..Default::default()
    }
}

/// Present derived parameters as literal environment variables, in table order.
fn env_vars(derived: &DerivedConfig) -> Vec<EnvVar> {
    derived
        .env_vars()
        .map(|(name, value)| EnvVar {
            name: name.to_string(),
            value: Some(value.to_string()),
            ..Default::default()
        })
        .collect()
}
