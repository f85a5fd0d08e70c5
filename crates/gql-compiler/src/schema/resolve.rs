//! Lowering of file-level ASTs into a resolved [`Schema`].
//!
//! Resolution is two-pass. Pass 1 walks every file and seeds the
//! [`TypeRegistry`] with a (kind, name) entry per top-level definition,
//! alongside the built-in scalars. Pass 2 walks the definitions again,
//! resolving every field, argument, member and implements reference through
//! the registry, then merges extensions in declaration order. Validation
//! passes (directive targets, interface conformance, input acyclicity) run
//! on the result, and client documents are bound against the finished
//! server schema. The registry never escapes a [`SchemaBuilder::build`]
//! call.

use std::collections::{HashMap, HashSet};

use indexmap::{IndexMap, IndexSet};

use gql_parser::ast::{
    self, ClientDefinition, Definition, DirectiveApplication, DirectiveLocation, Extension,
    FileNodes, NameNode, OperationType, TypeRef,
};
use gql_parser::Location;

use crate::schema::client::resolve_client;
use crate::schema::registry::{TypeRegistry, BUILT_IN_SCALARS};
use crate::schema::{
    ArrayFieldSpec, DirectiveDefinition, DirectiveUsage, EnumType, FieldDefinition,
    InputFieldDefinition, InputFieldSpec, InputType, InterfaceType, LiteralFieldSpec, Name,
    NonCallableFieldSpec, ObjectFieldDefinition, ObjectFieldSpec, ObjectType, OutputTypeRef,
    ScalarType, Schema, SchemaError, SchemaErrorKind, ServerSchema, TypeKind, UnionType,
};

/// Builds a [`Schema`] from parsed server files and client documents.
#[derive(Default)]
pub struct SchemaBuilder {
    files: Vec<FileNodes>,
    client_files: Vec<Vec<ClientDefinition>>,
}

impl SchemaBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a parsed server file. Extensions are merged in the order files
    /// are added, and within a file in source order.
    pub fn add_file(&mut self, file: FileNodes) -> &mut Self {
        self.files.push(file);
        self
    }

    /// Add a parsed client document.
    pub fn add_client_definitions(&mut self, definitions: Vec<ClientDefinition>) -> &mut Self {
        self.client_files.push(definitions);
        self
    }

    pub fn build(self) -> Result<Schema, SchemaError> {
        let mut registry = TypeRegistry::with_built_ins();
        let mut def_locations: HashMap<Name, Location> = HashMap::new();

        // Pass 1: seed the registry.
        for file in &self.files {
            for definition in &file.definitions {
                let kind = match definition {
                    Definition::ObjectType(_) => TypeKind::Object,
                    Definition::InterfaceType(_) => TypeKind::Interface,
                    Definition::InputType(_) => TypeKind::Input,
                    Definition::UnionType(_) => TypeKind::Union,
                    Definition::EnumType(_) => TypeKind::Enum,
                    Definition::ScalarType(_) => TypeKind::Scalar,
                    Definition::DirectiveDefinition(def) => {
                        registry.add_directive(&def.name)?;
                        continue;
                    }
                    Definition::SchemaDefinition(_) => continue,
                };
                let name = definition.name().expect("typed definitions are named");
                registry.add_type(kind, name)?;
                def_locations.insert(name.name.clone(), name.loc.location());
            }
        }

        let mut server = ServerSchema::default();
        for scalar in BUILT_IN_SCALARS {
            server.scalars.insert(
                (*scalar).to_string(),
                ScalarType {
                    name: (*scalar).to_string(),
                    directives: Vec::new(),
                },
            );
        }
        for directive in built_in_directives() {
            registry.add_built_in_directive(&directive.name);
            server.directives.insert(directive.name.clone(), directive);
        }

        // Pass 2: resolve definition bodies.
        let mut root_declarations: Vec<(OperationType, NameNode)> = Vec::new();
        let mut schema_definition_seen = false;
        for file in &self.files {
            for definition in &file.definitions {
                match definition {
                    Definition::ObjectType(def) => {
                        let object = ObjectType {
                            name: def.name.name.clone(),
                            implements: resolve_implements(&registry, &def.implements)?,
                            fields: resolve_object_fields(&registry, &def.fields)?,
                            directives: lower_directives(&def.directives),
                        };
                        server.objects.insert(def.name.name.clone(), object);
                    }
                    Definition::InterfaceType(def) => {
                        let interface = InterfaceType {
                            name: def.name.name.clone(),
                            fields: resolve_object_fields(&registry, &def.fields)?,
                            directives: lower_directives(&def.directives),
                        };
                        server.interfaces.insert(def.name.name.clone(), interface);
                    }
                    Definition::InputType(def) => {
                        let input = InputType {
                            name: def.name.name.clone(),
                            fields: resolve_input_fields(&registry, &def.fields)?,
                            directives: lower_directives(&def.directives),
                        };
                        server.inputs.insert(def.name.name.clone(), input);
                    }
                    Definition::UnionType(def) => {
                        let mut members = IndexSet::new();
                        for member in &def.members {
                            if !members.insert(registry.object_name(member)?) {
                                return Err(SchemaError::new(
                                    SchemaErrorKind::DuplicateField,
                                    format!(
                                        "union \"{}\" lists member \"{}\" more than once",
                                        def.name.name, member.name
                                    ),
                                    member.loc.location(),
                                ));
                            }
                        }
                        let union = UnionType {
                            name: def.name.name.clone(),
                            members,
                            directives: lower_directives(&def.directives),
                        };
                        server.unions.insert(def.name.name.clone(), union);
                    }
                    Definition::EnumType(def) => {
                        let mut values = IndexMap::new();
                        for value in &def.values {
                            values.insert(
                                value.name.name.clone(),
                                lower_directives(&value.directives),
                            );
                        }
                        let enum_type = EnumType {
                            name: def.name.name.clone(),
                            values,
                            directives: lower_directives(&def.directives),
                        };
                        server.enums.insert(def.name.name.clone(), enum_type);
                    }
                    Definition::ScalarType(def) => {
                        let scalar = ScalarType {
                            name: def.name.name.clone(),
                            directives: lower_directives(&def.directives),
                        };
                        server.scalars.insert(def.name.name.clone(), scalar);
                    }
                    Definition::DirectiveDefinition(def) => {
                        let directive = DirectiveDefinition {
                            name: def.name.name.clone(),
                            arguments: resolve_input_fields(&registry, &def.arguments)?,
                            repeatable: def.repeatable,
                            locations: def.locations.clone(),
                        };
                        server.directives.insert(def.name.name.clone(), directive);
                    }
                    Definition::SchemaDefinition(def) => {
                        schema_definition_seen = true;
                        for (op_type, name) in [
                            (OperationType::Query, &def.query),
                            (OperationType::Mutation, &def.mutation),
                            (OperationType::Subscription, &def.subscription),
                        ] {
                            if let Some(name) = name {
                                root_declarations.push((op_type, name.clone()));
                            }
                        }
                    }
                }
            }
        }

        // Extensions merge after all base definitions exist.
        for file in &self.files {
            for extension in &file.extensions {
                merge_extension(&registry, &mut server, extension)?;
            }
        }

        resolve_root_operations(
            &registry,
            &mut server,
            schema_definition_seen,
            &root_declarations,
        )?;

        validate_directives(&self.files, &server)?;
        validate_interfaces(&server, &def_locations)?;
        validate_input_cycles(&server, &def_locations)?;

        let client = resolve_client(&registry, &server, &self.client_files)?;

        // The registry is dropped here; the schema is self-contained.
        Ok(Schema { server, client })
    }
}

/// The directive definitions every schema starts from.
fn built_in_directives() -> Vec<DirectiveDefinition> {
    let boolean_argument = |name: &str| InputFieldDefinition {
        name: name.to_string(),
        spec: InputFieldSpec::Literal(LiteralFieldSpec {
            ty: crate::schema::InputTypeRef::Scalar {
                name: "Boolean".to_string(),
            },
            default_value: None,
        }),
        nullable: false,
    };
    let string_argument = |name: &str, nullable: bool, default: Option<&str>| InputFieldDefinition {
        name: name.to_string(),
        spec: InputFieldSpec::Literal(LiteralFieldSpec {
            ty: crate::schema::InputTypeRef::Scalar {
                name: "String".to_string(),
            },
            default_value: default.map(|d| ast::Literal::String(d.to_string())),
        }),
        nullable,
    };
    vec![
        DirectiveDefinition {
            name: "skip".to_string(),
            arguments: IndexMap::from([("if".to_string(), boolean_argument("if"))]),
            repeatable: false,
            locations: vec![
                DirectiveLocation::Field,
                DirectiveLocation::FragmentSpread,
                DirectiveLocation::InlineFragment,
            ],
        },
        DirectiveDefinition {
            name: "include".to_string(),
            arguments: IndexMap::from([("if".to_string(), boolean_argument("if"))]),
            repeatable: false,
            locations: vec![
                DirectiveLocation::Field,
                DirectiveLocation::FragmentSpread,
                DirectiveLocation::InlineFragment,
            ],
        },
        DirectiveDefinition {
            name: "deprecated".to_string(),
            arguments: IndexMap::from([(
                "reason".to_string(),
                string_argument("reason", true, Some("No longer supported")),
            )]),
            repeatable: false,
            locations: vec![
                DirectiveLocation::FieldDefinition,
                DirectiveLocation::ArgumentDefinition,
                DirectiveLocation::InputFieldDefinition,
                DirectiveLocation::EnumValue,
            ],
        },
        DirectiveDefinition {
            name: "specifiedBy".to_string(),
            arguments: IndexMap::from([(
                "url".to_string(),
                string_argument("url", false, None),
            )]),
            repeatable: false,
            locations: vec![DirectiveLocation::Scalar],
        },
    ]
}

fn lower_directives(applications: &[DirectiveApplication]) -> Vec<DirectiveUsage> {
    applications
        .iter()
        .map(|application| DirectiveUsage {
            name: application.name.name.clone(),
            arguments: application.arguments.clone(),
        })
        .collect()
}

fn resolve_implements(
    registry: &TypeRegistry,
    implements: &[NameNode],
) -> Result<IndexSet<Name>, SchemaError> {
    let mut resolved = IndexSet::new();
    for interface in implements {
        if !resolved.insert(registry.interface_name(interface)?) {
            return Err(SchemaError::new(
                SchemaErrorKind::DuplicateField,
                format!("interface \"{}\" is implemented more than once", interface.name),
                interface.loc.location(),
            ));
        }
    }
    Ok(resolved)
}

fn resolve_object_fields(
    registry: &TypeRegistry,
    fields: &IndexMap<String, ast::FieldDefinition>,
) -> Result<IndexMap<Name, ObjectFieldDefinition>, SchemaError> {
    let mut resolved = IndexMap::new();
    for (name, field) in fields {
        resolved.insert(name.clone(), lower_object_field(registry, field)?);
    }
    Ok(resolved)
}

fn resolve_input_fields(
    registry: &TypeRegistry,
    fields: &IndexMap<String, ast::InputValueDefinition>,
) -> Result<IndexMap<Name, InputFieldDefinition>, SchemaError> {
    let mut resolved = IndexMap::new();
    for (name, field) in fields {
        resolved.insert(name.clone(), lower_input_field(registry, field)?);
    }
    Ok(resolved)
}

/// Lower an input value definition: `Named` becomes a literal spec, `List`
/// an array spec with the element's own nullability preserved.
pub(crate) fn lower_input_field(
    registry: &TypeRegistry,
    definition: &ast::InputValueDefinition,
) -> Result<InputFieldDefinition, SchemaError> {
    let (spec, nullable) = match &definition.ty {
        TypeRef::Named { name, nullable, .. } => (
            InputFieldSpec::Literal(LiteralFieldSpec {
                ty: registry.input_ref(name)?,
                default_value: definition.default_value.clone(),
            }),
            *nullable,
        ),
        TypeRef::List {
            inner, nullable, ..
        } => match inner.as_ref() {
            TypeRef::Named {
                name,
                nullable: element_nullable,
                ..
            } => (
                InputFieldSpec::Array(ArrayFieldSpec {
                    ty: registry.input_ref(name)?,
                    nullable: *element_nullable,
                    default_value: definition.default_value.clone(),
                }),
                *nullable,
            ),
            TypeRef::List { loc, .. } => {
                return Err(SchemaError::new(
                    SchemaErrorKind::InvalidInputType,
                    "nested list types are not supported",
                    loc.location(),
                ));
            }
        },
    };
    Ok(FieldDefinition {
        name: definition.name.name.clone(),
        spec,
        nullable,
    })
}

fn lower_output_parts(
    registry: &TypeRegistry,
    ty: &TypeRef,
) -> Result<(NonCallableFieldSpec, bool), SchemaError> {
    match ty {
        TypeRef::Named { name, nullable, .. } => Ok((
            NonCallableFieldSpec::Literal(LiteralFieldSpec {
                ty: registry.output_ref(name)?,
                default_value: None,
            }),
            *nullable,
        )),
        TypeRef::List {
            inner, nullable, ..
        } => match inner.as_ref() {
            TypeRef::Named {
                name,
                nullable: element_nullable,
                ..
            } => Ok((
                NonCallableFieldSpec::Array(ArrayFieldSpec {
                    ty: registry.output_ref(name)?,
                    nullable: *element_nullable,
                    default_value: None,
                }),
                *nullable,
            )),
            TypeRef::List { loc, .. } => Err(SchemaError::new(
                SchemaErrorKind::InvalidInputType,
                "nested list types are not supported",
                loc.location(),
            )),
        },
    }
}

/// Lower a server field definition. A field with arguments becomes a
/// callable spec; otherwise the spec mirrors its type reference.
fn lower_object_field(
    registry: &TypeRegistry,
    field: &ast::FieldDefinition,
) -> Result<ObjectFieldDefinition, SchemaError> {
    let (return_spec, nullable) = lower_output_parts(registry, &field.ty)?;
    let spec = if field.arguments.is_empty() {
        match return_spec {
            NonCallableFieldSpec::Literal(spec) => ObjectFieldSpec::Literal(spec),
            NonCallableFieldSpec::Array(spec) => ObjectFieldSpec::Array(spec),
        }
    } else {
        ObjectFieldSpec::Callable {
            return_type: return_spec,
            arguments: resolve_input_fields(registry, &field.arguments)?,
        }
    };
    Ok(FieldDefinition {
        name: field.name.name.clone(),
        spec,
        nullable,
    })
}

/// Merge one `extend` declaration into its base entity. The base must
/// already exist with the same kind; contributed fields, members and values
/// must not redeclare existing ones.
fn merge_extension(
    registry: &TypeRegistry,
    server: &mut ServerSchema,
    extension: &Extension,
) -> Result<(), SchemaError> {
    match extension {
        Extension::ObjectType(ext) => {
            let implements = resolve_implements(registry, &ext.implements)?;
            let fields = resolve_object_fields(registry, &ext.fields)?;
            let directives = lower_directives(&ext.directives);
            let Some(object) = server.objects.get_mut(&ext.name.name) else {
                return Err(unknown_extension_target(&ext.name, "object"));
            };
            for (name, field) in fields {
                let loc = ext.fields[&name].name.loc.location();
                if object.fields.contains_key(&name) {
                    return Err(duplicate_extension_field(&ext.name.name, &name, loc));
                }
                object.fields.insert(name, field);
            }
            for interface in implements {
                if !object.implements.insert(interface.clone()) {
                    return Err(SchemaError::new(
                        SchemaErrorKind::DuplicateField,
                        format!(
                            "type \"{}\" already implements \"{}\"",
                            ext.name.name, interface
                        ),
                        ext.name.loc.location(),
                    ));
                }
            }
            object.directives.extend(directives);
        }
        Extension::InterfaceType(ext) => {
            let fields = resolve_object_fields(registry, &ext.fields)?;
            let directives = lower_directives(&ext.directives);
            let Some(interface) = server.interfaces.get_mut(&ext.name.name) else {
                return Err(unknown_extension_target(&ext.name, "interface"));
            };
            for (name, field) in fields {
                let loc = ext.fields[&name].name.loc.location();
                if interface.fields.contains_key(&name) {
                    return Err(duplicate_extension_field(&ext.name.name, &name, loc));
                }
                interface.fields.insert(name, field);
            }
            interface.directives.extend(directives);
        }
        Extension::InputType(ext) => {
            let fields = resolve_input_fields(registry, &ext.fields)?;
            let directives = lower_directives(&ext.directives);
            let Some(input) = server.inputs.get_mut(&ext.name.name) else {
                return Err(unknown_extension_target(&ext.name, "input"));
            };
            for (name, field) in fields {
                let loc = ext.fields[&name].name.loc.location();
                if input.fields.contains_key(&name) {
                    return Err(duplicate_extension_field(&ext.name.name, &name, loc));
                }
                input.fields.insert(name, field);
            }
            input.directives.extend(directives);
        }
        Extension::UnionType(ext) => {
            let mut members = Vec::new();
            for member in &ext.members {
                members.push((registry.object_name(member)?, member.loc.location()));
            }
            let directives = lower_directives(&ext.directives);
            let Some(union) = server.unions.get_mut(&ext.name.name) else {
                return Err(unknown_extension_target(&ext.name, "union"));
            };
            for (member, loc) in members {
                if !union.members.insert(member.clone()) {
                    return Err(SchemaError::new(
                        SchemaErrorKind::DuplicateField,
                        format!(
                            "union \"{}\" already contains member \"{}\"",
                            ext.name.name, member
                        ),
                        loc,
                    ));
                }
            }
            union.directives.extend(directives);
        }
        Extension::EnumType(ext) => {
            let directives = lower_directives(&ext.directives);
            let Some(enum_type) = server.enums.get_mut(&ext.name.name) else {
                return Err(unknown_extension_target(&ext.name, "enum"));
            };
            for value in &ext.values {
                if enum_type.values.contains_key(&value.name.name) {
                    return Err(SchemaError::new(
                        SchemaErrorKind::DuplicateField,
                        format!(
                            "enum \"{}\" already contains value \"{}\"",
                            ext.name.name, value.name.name
                        ),
                        value.name.loc.location(),
                    ));
                }
                enum_type
                    .values
                    .insert(value.name.name.clone(), lower_directives(&value.directives));
            }
            enum_type.directives.extend(directives);
        }
        Extension::ScalarType(ext) => {
            let directives = lower_directives(&ext.directives);
            let Some(scalar) = server.scalars.get_mut(&ext.name.name) else {
                return Err(unknown_extension_target(&ext.name, "scalar"));
            };
            scalar.directives.extend(directives);
        }
    }
    Ok(())
}

fn unknown_extension_target(name: &NameNode, kind: &str) -> SchemaError {
    SchemaError::new(
        SchemaErrorKind::UnknownType,
        format!("cannot extend undefined {} type \"{}\"", kind, name.name),
        name.loc.location(),
    )
}

fn duplicate_extension_field(type_name: &str, field_name: &str, location: Location) -> SchemaError {
    SchemaError::new(
        SchemaErrorKind::DuplicateField,
        format!(
            "extension redeclares field \"{}\" of type \"{}\"",
            field_name, type_name
        ),
        location,
    )
}

/// Bind the root operation types. Explicit declarations win, first one per
/// operation; the default names apply only when no `schema` definition is
/// present at all.
fn resolve_root_operations(
    registry: &TypeRegistry,
    server: &mut ServerSchema,
    schema_definition_seen: bool,
    declarations: &[(OperationType, NameNode)],
) -> Result<(), SchemaError> {
    for (op_type, name) in declarations {
        match registry.kind_of(&name.name) {
            None => return Err(registry.unknown(name)),
            Some(TypeKind::Object) => {}
            Some(kind) => {
                return Err(SchemaError::new(
                    SchemaErrorKind::RootOperationNotObject,
                    format!(
                        "{} root operation type \"{}\" must be an object type, not {}",
                        op_type.keyword(),
                        name.name,
                        kind
                    ),
                    name.loc.location(),
                ));
            }
        }
        let slot = match op_type {
            OperationType::Query => &mut server.query_type,
            OperationType::Mutation => &mut server.mutation_type,
            OperationType::Subscription => &mut server.subscription_type,
        };
        slot.get_or_insert_with(|| name.name.clone());
    }

    if !schema_definition_seen {
        for op_type in [
            OperationType::Query,
            OperationType::Mutation,
            OperationType::Subscription,
        ] {
            let default_name = op_type.default_type_name();
            if registry.kind_of(default_name) == Some(TypeKind::Object) {
                let slot = match op_type {
                    OperationType::Query => &mut server.query_type,
                    OperationType::Mutation => &mut server.mutation_type,
                    OperationType::Subscription => &mut server.subscription_type,
                };
                slot.get_or_insert_with(|| default_name.to_string());
            }
        }
    }
    Ok(())
}

/// Validate every directive application in the server files: the directive
/// must exist, the target kind must be among its declared locations, and a
/// non-repeatable directive may appear at most once per target.
fn validate_directives(files: &[FileNodes], server: &ServerSchema) -> Result<(), SchemaError> {
    let mut seen: HashSet<(String, Name)> = HashSet::new();
    let seen = &mut seen;
    fn check(
        server: &ServerSchema,
        seen: &mut HashSet<(String, Name)>,
        applications: &[DirectiveApplication],
        location: DirectiveLocation,
        target: &str,
    ) -> Result<(), SchemaError> {
        for application in applications {
            check_directive_application(server, seen, application, location, target)?;
        }
        Ok(())
    }

    for file in files {
        for definition in &file.definitions {
            match definition {
                Definition::ObjectType(def) => {
                    check(server, seen, &def.directives, DirectiveLocation::Object, &def.name.name)?;
                    check_field_directives(server, seen, &def.name.name, &def.fields)?;
                }
                Definition::InterfaceType(def) => {
                    check(server, seen, &def.directives, DirectiveLocation::Interface, &def.name.name)?;
                    check_field_directives(server, seen, &def.name.name, &def.fields)?;
                }
                Definition::InputType(def) => {
                    check(
                        server,
                        seen,
                        &def.directives,
                        DirectiveLocation::InputObject,
                        &def.name.name,
                    )?;
                }
                Definition::UnionType(def) => {
                    check(server, seen, &def.directives, DirectiveLocation::Union, &def.name.name)?;
                }
                Definition::EnumType(def) => {
                    check(server, seen, &def.directives, DirectiveLocation::Enum, &def.name.name)?;
                    for value in &def.values {
                        let target = format!("{}.{}", def.name.name, value.name.name);
                        for application in &value.directives {
                            check_directive_application(
                                server,
                                seen,
                                application,
                                DirectiveLocation::EnumValue,
                                &target,
                            )?;
                        }
                    }
                }
                Definition::ScalarType(def) => {
                    check(server, seen, &def.directives, DirectiveLocation::Scalar, &def.name.name)?;
                }
                Definition::DirectiveDefinition(_) | Definition::SchemaDefinition(_) => {}
            }
        }
        for extension in &file.extensions {
            match extension {
                Extension::ObjectType(ext) => {
                    check(server, seen, &ext.directives, DirectiveLocation::Object, &ext.name.name)?;
                    check_field_directives(server, seen, &ext.name.name, &ext.fields)?;
                }
                Extension::InterfaceType(ext) => {
                    check(server, seen, &ext.directives, DirectiveLocation::Interface, &ext.name.name)?;
                    check_field_directives(server, seen, &ext.name.name, &ext.fields)?;
                }
                Extension::InputType(ext) => {
                    check(
                        server,
                        seen,
                        &ext.directives,
                        DirectiveLocation::InputObject,
                        &ext.name.name,
                    )?;
                }
                Extension::UnionType(ext) => {
                    check(server, seen, &ext.directives, DirectiveLocation::Union, &ext.name.name)?;
                }
                Extension::EnumType(ext) => {
                    check(server, seen, &ext.directives, DirectiveLocation::Enum, &ext.name.name)?;
                    for value in &ext.values {
                        let target = format!("{}.{}", ext.name.name, value.name.name);
                        for application in &value.directives {
                            check_directive_application(
                                server,
                                seen,
                                application,
                                DirectiveLocation::EnumValue,
                                &target,
                            )?;
                        }
                    }
                }
                Extension::ScalarType(ext) => {
                    check(server, seen, &ext.directives, DirectiveLocation::Scalar, &ext.name.name)?;
                }
            }
        }
    }
    Ok(())
}

fn check_field_directives(
    server: &ServerSchema,
    seen: &mut HashSet<(String, Name)>,
    type_name: &str,
    fields: &IndexMap<String, ast::FieldDefinition>,
) -> Result<(), SchemaError> {
    for (field_name, field) in fields {
        let target = format!("{type_name}.{field_name}");
        for application in &field.directives {
            check_directive_application(
                server,
                seen,
                application,
                DirectiveLocation::FieldDefinition,
                &target,
            )?;
        }
    }
    Ok(())
}

pub(crate) fn check_directive_application(
    server: &ServerSchema,
    seen: &mut HashSet<(String, Name)>,
    application: &DirectiveApplication,
    location: DirectiveLocation,
    target: &str,
) -> Result<(), SchemaError> {
    let Some(definition) = server.directives.get(&application.name.name) else {
        return Err(SchemaError::new(
            SchemaErrorKind::UnknownType,
            format!("unknown directive \"@{}\"", application.name.name),
            application.name.loc.location(),
        ));
    };
    if !definition.locations.contains(&location) {
        return Err(SchemaError::new(
            SchemaErrorKind::DirectiveTargetMismatch,
            format!(
                "directive \"@{}\" may not be applied to {:?} targets",
                application.name.name, location
            ),
            application.name.loc.location(),
        ));
    }
    if !definition.repeatable
        && !seen.insert((target.to_string(), application.name.name.clone()))
    {
        return Err(SchemaError::new(
            SchemaErrorKind::NonRepeatableDirectiveRepeated,
            format!(
                "non-repeatable directive \"@{}\" applied more than once to \"{}\"",
                application.name.name, target
            ),
            application.name.loc.location(),
        ));
    }
    Ok(())
}

/// Check every object against the interfaces it implements: each interface
/// field must exist with an equal-or-more-specific return type, a
/// compatible argument set and nullability no weaker than the interface's.
fn validate_interfaces(
    server: &ServerSchema,
    def_locations: &HashMap<Name, Location>,
) -> Result<(), SchemaError> {
    for (object_name, object) in &server.objects {
        let location = &def_locations[object_name];
        for interface_name in &object.implements {
            let interface = &server.interfaces[interface_name];
            for (field_name, interface_field) in &interface.fields {
                let Some(object_field) = object.fields.get(field_name) else {
                    return Err(not_satisfied(
                        object_name,
                        interface_name,
                        format!("field \"{field_name}\" is missing"),
                        location,
                    ));
                };
                if let Err(detail) =
                    field_conforms(server, object_field, interface_field)
                {
                    return Err(not_satisfied(
                        object_name,
                        interface_name,
                        format!("field \"{field_name}\" {detail}"),
                        location,
                    ));
                }
            }
        }
    }
    Ok(())
}

fn not_satisfied(
    object_name: &str,
    interface_name: &str,
    detail: String,
    location: &Location,
) -> SchemaError {
    SchemaError::new(
        SchemaErrorKind::InterfaceNotSatisfied,
        format!("type \"{object_name}\" does not satisfy interface \"{interface_name}\": {detail}"),
        location.clone(),
    )
}

/// One field's conformance; returns a human-readable reason on failure.
fn field_conforms(
    server: &ServerSchema,
    object_field: &ObjectFieldDefinition,
    interface_field: &ObjectFieldDefinition,
) -> Result<(), String> {
    if object_field.nullable && !interface_field.nullable {
        return Err("is nullable where the interface requires non-null".to_string());
    }

    let (object_ty, object_element) = return_shape(&object_field.spec);
    let (interface_ty, interface_element) = return_shape(&interface_field.spec);
    match (object_element, interface_element) {
        (None, None) => {}
        (Some(object_nullable), Some(interface_nullable)) => {
            if object_nullable && !interface_nullable {
                return Err(
                    "has nullable list elements where the interface requires non-null".to_string(),
                );
            }
        }
        _ => return Err("differs in list shape from the interface".to_string()),
    }
    if !return_type_covariant(server, object_ty, interface_ty) {
        return Err(format!(
            "returns \"{object_ty}\" which is not \"{interface_ty}\" or a subtype of it"
        ));
    }

    let empty = IndexMap::new();
    let object_arguments = object_field.spec.arguments().unwrap_or(&empty);
    let interface_arguments = interface_field.spec.arguments().unwrap_or(&empty);
    for (name, interface_argument) in interface_arguments {
        let Some(object_argument) = object_arguments.get(name) else {
            return Err(format!("is missing argument \"{name}\""));
        };
        if !input_types_identical(object_argument, interface_argument) {
            return Err(format!(
                "declares argument \"{name}\" with type {object_argument} instead of {interface_argument}"
            ));
        }
    }
    for (name, object_argument) in object_arguments {
        if !interface_arguments.contains_key(name)
            && !object_argument.nullable
            && object_argument.spec.default_value().is_none()
        {
            return Err(format!(
                "adds required argument \"{name}\" not declared by the interface"
            ));
        }
    }
    Ok(())
}

/// (return type, element nullability when the field is a list)
fn return_shape(spec: &ObjectFieldSpec) -> (&OutputTypeRef, Option<bool>) {
    match spec {
        ObjectFieldSpec::Literal(spec) => (&spec.ty, None),
        ObjectFieldSpec::Array(spec) => (&spec.ty, Some(spec.nullable)),
        ObjectFieldSpec::Callable { return_type, .. } => match return_type {
            NonCallableFieldSpec::Literal(spec) => (&spec.ty, None),
            NonCallableFieldSpec::Array(spec) => (&spec.ty, Some(spec.nullable)),
        },
    }
}

fn return_type_covariant(
    server: &ServerSchema,
    object_ty: &OutputTypeRef,
    interface_ty: &OutputTypeRef,
) -> bool {
    if object_ty == interface_ty {
        return true;
    }
    match (object_ty, interface_ty) {
        (OutputTypeRef::Object { name: object }, OutputTypeRef::Interface { name })
        | (OutputTypeRef::Object { name: object }, OutputTypeRef::Union { name }) => {
            server.is_subtype(name, object)
        }
        _ => false,
    }
}

fn input_types_identical(a: &InputFieldDefinition, b: &InputFieldDefinition) -> bool {
    if a.nullable != b.nullable {
        return false;
    }
    match (&a.spec, &b.spec) {
        (InputFieldSpec::Literal(a), InputFieldSpec::Literal(b)) => a.ty == b.ty,
        (InputFieldSpec::Array(a), InputFieldSpec::Array(b)) => {
            a.ty == b.ty && a.nullable == b.nullable
        }
        _ => false,
    }
}

/// Reject cycles among input types reachable through non-nullable,
/// non-list fields: such a cycle has no finite value.
fn validate_input_cycles(
    server: &ServerSchema,
    def_locations: &HashMap<Name, Location>,
) -> Result<(), SchemaError> {
    #[derive(Clone, Copy, PartialEq)]
    enum State {
        InProgress,
        Done,
    }

    fn visit(
        server: &ServerSchema,
        states: &mut HashMap<Name, State>,
        name: &str,
    ) -> Option<Name> {
        match states.get(name) {
            Some(State::Done) => return None,
            Some(State::InProgress) => return Some(name.to_string()),
            None => {}
        }
        states.insert(name.to_string(), State::InProgress);
        if let Some(input) = server.inputs.get(name) {
            for field in input.fields.values() {
                if field.nullable {
                    continue;
                }
                if let InputFieldSpec::Literal(spec) = &field.spec {
                    if let crate::schema::InputTypeRef::Input { name: target } = &spec.ty {
                        if let Some(cycle) = visit(server, states, target) {
                            return Some(cycle);
                        }
                    }
                }
            }
        }
        states.insert(name.to_string(), State::Done);
        None
    }

    let mut states = HashMap::new();
    for name in server.inputs.keys() {
        if let Some(cycle_start) = visit(server, &mut states, name) {
            return Err(SchemaError::new(
                SchemaErrorKind::InputCycle,
                format!(
                    "input type \"{cycle_start}\" references itself through non-nullable fields"
                ),
                def_locations[&cycle_start].clone(),
            ));
        }
    }
    Ok(())
}
