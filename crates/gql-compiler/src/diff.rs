//! Structural diff between two resolved server schemas.
//!
//! Differences are keyed by entity path (`objects.Query.fields.hello`,
//! `enums.Color.values.RED`, …) and describe how the `remote` schema
//! differs from the `local` one: entries present only remotely are
//! [`Change::Added`], entries present only locally are [`Change::Removed`].
//! No parsing logic lives here; both inputs are already resolved.

use std::fmt;

use indexmap::IndexMap;
use serde::Serialize;

use crate::schema::{
    DirectiveDefinition, DirectiveUsage, EnumType, InputType, InterfaceType, ObjectType,
    ScalarType, ServerSchema, UnionType,
};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "change", rename_all = "lowercase")]
pub enum Change {
    Added,
    Removed,
    Changed { from: String, to: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Difference {
    pub path: String,
    #[serde(flatten)]
    pub change: Change,
}

impl fmt::Display for Difference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.change {
            Change::Added => write!(f, "+ {}", self.path),
            Change::Removed => write!(f, "- {}", self.path),
            Change::Changed { from, to } => {
                write!(f, "~ {}: {} -> {}", self.path, from, to)
            }
        }
    }
}

/// Compare two resolved server schemas entity by entity.
pub fn diff_schemas(local: &ServerSchema, remote: &ServerSchema) -> Vec<Difference> {
    let mut differences = Vec::new();

    diff_keyed(
        &mut differences,
        "scalars",
        &local.scalars,
        &remote.scalars,
        diff_scalar,
    );
    diff_keyed(
        &mut differences,
        "enums",
        &local.enums,
        &remote.enums,
        diff_enum,
    );
    diff_keyed(
        &mut differences,
        "inputs",
        &local.inputs,
        &remote.inputs,
        diff_input,
    );
    diff_keyed(
        &mut differences,
        "objects",
        &local.objects,
        &remote.objects,
        diff_object,
    );
    diff_keyed(
        &mut differences,
        "interfaces",
        &local.interfaces,
        &remote.interfaces,
        diff_interface,
    );
    diff_keyed(
        &mut differences,
        "unions",
        &local.unions,
        &remote.unions,
        diff_union,
    );
    diff_keyed(
        &mut differences,
        "directives",
        &local.directives,
        &remote.directives,
        diff_directive,
    );

    for (slot, local_root, remote_root) in [
        ("schema.query", &local.query_type, &remote.query_type),
        ("schema.mutation", &local.mutation_type, &remote.mutation_type),
        (
            "schema.subscription",
            &local.subscription_type,
            &remote.subscription_type,
        ),
    ] {
        match (local_root, remote_root) {
            (None, Some(_)) => differences.push(Difference {
                path: slot.to_string(),
                change: Change::Added,
            }),
            (Some(_), None) => differences.push(Difference {
                path: slot.to_string(),
                change: Change::Removed,
            }),
            (Some(local_name), Some(remote_name)) if local_name != remote_name => {
                differences.push(Difference {
                    path: slot.to_string(),
                    change: Change::Changed {
                        from: local_name.clone(),
                        to: remote_name.clone(),
                    },
                })
            }
            _ => {}
        }
    }

    differences
}

/// Walk one pair of per-kind dictionaries: report added/removed keys, and
/// descend into entries present on both sides.
fn diff_keyed<T>(
    differences: &mut Vec<Difference>,
    kind: &str,
    local: &IndexMap<String, T>,
    remote: &IndexMap<String, T>,
    diff_entry: impl Fn(&mut Vec<Difference>, &str, &T, &T),
) {
    for name in local.keys() {
        if !remote.contains_key(name) {
            differences.push(Difference {
                path: format!("{kind}.{name}"),
                change: Change::Removed,
            });
        }
    }
    for (name, remote_entry) in remote {
        match local.get(name) {
            None => differences.push(Difference {
                path: format!("{kind}.{name}"),
                change: Change::Added,
            }),
            Some(local_entry) => {
                diff_entry(
                    differences,
                    &format!("{kind}.{name}"),
                    local_entry,
                    remote_entry,
                );
            }
        }
    }
}

fn diff_directive_usages(
    differences: &mut Vec<Difference>,
    path: &str,
    local: &[DirectiveUsage],
    remote: &[DirectiveUsage],
) {
    for usage in local {
        if !remote.iter().any(|u| u.name == usage.name) {
            differences.push(Difference {
                path: format!("{path}.@{}", usage.name),
                change: Change::Removed,
            });
        }
    }
    for usage in remote {
        if !local.iter().any(|u| u.name == usage.name) {
            differences.push(Difference {
                path: format!("{path}.@{}", usage.name),
                change: Change::Added,
            });
        }
    }
}

fn diff_enum(differences: &mut Vec<Difference>, path: &str, local: &EnumType, remote: &EnumType) {
    for value in local.values.keys() {
        if !remote.values.contains_key(value) {
            differences.push(Difference {
                path: format!("{path}.values.{value}"),
                change: Change::Removed,
            });
        }
    }
    for value in remote.values.keys() {
        if !local.values.contains_key(value) {
            differences.push(Difference {
                path: format!("{path}.values.{value}"),
                change: Change::Added,
            });
        }
    }
    diff_directive_usages(differences, path, &local.directives, &remote.directives);
}

fn diff_union(differences: &mut Vec<Difference>, path: &str, local: &UnionType, remote: &UnionType) {
    for member in &local.members {
        if !remote.members.contains(member) {
            differences.push(Difference {
                path: format!("{path}.members.{member}"),
                change: Change::Removed,
            });
        }
    }
    for member in &remote.members {
        if !local.members.contains(member) {
            differences.push(Difference {
                path: format!("{path}.members.{member}"),
                change: Change::Added,
            });
        }
    }
    diff_directive_usages(differences, path, &local.directives, &remote.directives);
}

fn diff_input(differences: &mut Vec<Difference>, path: &str, local: &InputType, remote: &InputType) {
    diff_rendered_fields(
        differences,
        &format!("{path}.fields"),
        &local.fields.iter().map(|(k, v)| (k.clone(), v.to_string())).collect(),
        &remote.fields.iter().map(|(k, v)| (k.clone(), v.to_string())).collect(),
    );
    diff_directive_usages(differences, path, &local.directives, &remote.directives);
}

fn diff_object(
    differences: &mut Vec<Difference>,
    path: &str,
    local: &ObjectType,
    remote: &ObjectType,
) {
    for interface in &local.implements {
        if !remote.implements.contains(interface) {
            differences.push(Difference {
                path: format!("{path}.implements.{interface}"),
                change: Change::Removed,
            });
        }
    }
    for interface in &remote.implements {
        if !local.implements.contains(interface) {
            differences.push(Difference {
                path: format!("{path}.implements.{interface}"),
                change: Change::Added,
            });
        }
    }
    diff_rendered_fields(
        differences,
        &format!("{path}.fields"),
        &local.fields.iter().map(|(k, v)| (k.clone(), v.to_string())).collect(),
        &remote.fields.iter().map(|(k, v)| (k.clone(), v.to_string())).collect(),
    );
    diff_directive_usages(differences, path, &local.directives, &remote.directives);
}

fn diff_interface(
    differences: &mut Vec<Difference>,
    path: &str,
    local: &InterfaceType,
    remote: &InterfaceType,
) {
    diff_rendered_fields(
        differences,
        &format!("{path}.fields"),
        &local.fields.iter().map(|(k, v)| (k.clone(), v.to_string())).collect(),
        &remote.fields.iter().map(|(k, v)| (k.clone(), v.to_string())).collect(),
    );
    diff_directive_usages(differences, path, &local.directives, &remote.directives);
}

fn diff_directive(
    differences: &mut Vec<Difference>,
    path: &str,
    local: &DirectiveDefinition,
    remote: &DirectiveDefinition,
) {
    diff_rendered_fields(
        differences,
        &format!("{path}.arguments"),
        &local.arguments.iter().map(|(k, v)| (k.clone(), v.to_string())).collect(),
        &remote.arguments.iter().map(|(k, v)| (k.clone(), v.to_string())).collect(),
    );
    if local.repeatable != remote.repeatable {
        differences.push(Difference {
            path: format!("{path}.repeatable"),
            change: Change::Changed {
                from: local.repeatable.to_string(),
                to: remote.repeatable.to_string(),
            },
        });
    }
    if local.locations != remote.locations {
        differences.push(Difference {
            path: format!("{path}.locations"),
            change: Change::Changed {
                from: format!("{:?}", local.locations),
                to: format!("{:?}", remote.locations),
            },
        });
    }
}

/// Compare two maps of fields rendered to their GraphQL type strings.
fn diff_rendered_fields(
    differences: &mut Vec<Difference>,
    path: &str,
    local: &IndexMap<String, String>,
    remote: &IndexMap<String, String>,
) {
    for (name, local_rendering) in local {
        match remote.get(name) {
            None => differences.push(Difference {
                path: format!("{path}.{name}"),
                change: Change::Removed,
            }),
            Some(remote_rendering) if remote_rendering != local_rendering => {
                differences.push(Difference {
                    path: format!("{path}.{name}"),
                    change: Change::Changed {
                        from: local_rendering.clone(),
                        to: remote_rendering.clone(),
                    },
                });
            }
            Some(_) => {}
        }
    }
    for name in remote.keys() {
        if !local.contains_key(name) {
            differences.push(Difference {
                path: format!("{path}.{name}"),
                change: Change::Added,
            });
        }
    }
}

fn diff_scalar(
    differences: &mut Vec<Difference>,
    path: &str,
    local: &ScalarType,
    remote: &ScalarType,
) {
    diff_directive_usages(differences, path, &local.directives, &remote.directives);
}
