use std::any::Any;
use std::collections::{HashMap, HashSet};

use rtsl_registry::{TypeRegistry, TypeRegistryBuilder};
use rtsl_scene::{InstanceId, RuntimeObject, World};
use rtsl_types::{FieldValue, Identity, RuntimeType, SurrogateRecord, SurrogateType};
use tracing::trace;

use crate::error::{CodecError, CodecResult};
use crate::identity::{IdentityStore, ResolveIdentity};
use crate::schema::{FieldShape, FieldSpec, LiveValue, SurrogateSchema};
use crate::surrogates;

/// Collects schemas and value registrations.
#[derive(Default)]
pub struct CodecBuilder {
    registry: TypeRegistryBuilder,
    schemas: HashMap<SurrogateType, SurrogateSchema>,
}

impl CodecBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an object schema and its type mapping.
    pub fn register(&mut self, schema: SurrogateSchema) -> CodecResult<&mut Self> {
        if self.schemas.contains_key(schema.surrogate()) {
            return Err(CodecError::DuplicateSchema(schema.surrogate().clone()));
        }
        self.registry.register(schema.runtime(), schema.surrogate().clone())?;
        self.schemas.insert(schema.surrogate().clone(), schema);
        Ok(self)
    }

    /// Register an embedded value type. Values have no schema of their own.
    pub fn register_value<T: Any>(
        &mut self,
        surrogate: impl Into<SurrogateType>,
    ) -> CodecResult<&mut Self> {
        self.registry.register_type::<T>(surrogate)?;
        Ok(self)
    }

    /// Register every built-in scene type and value type.
    pub fn with_builtin_surrogates(&mut self) -> CodecResult<&mut Self> {
        surrogates::register_builtin(self)?;
        Ok(self)
    }

    pub fn build(self) -> Codec {
        Codec {
            registry: self.registry.build(),
            schemas: self.schemas,
        }
    }
}

/// Converts live objects to surrogate records and back.
///
/// Immutable once built; one codec is shared by every save and load pass.
pub struct Codec {
    registry: TypeRegistry,
    schemas: HashMap<SurrogateType, SurrogateSchema>,
}

impl Codec {
    pub fn builder() -> CodecBuilder {
        CodecBuilder::new()
    }

    /// A codec knowing every built-in type.
    pub fn with_builtin_surrogates() -> CodecResult<Self> {
        let mut builder = Self::builder();
        builder.with_builtin_surrogates()?;
        Ok(builder.build())
    }

    pub fn registry(&self) -> &TypeRegistry {
        &self.registry
    }

    pub fn schema(&self, surrogate: &SurrogateType) -> CodecResult<&SurrogateSchema> {
        self.schemas
            .get(surrogate)
            .ok_or_else(|| CodecError::UnregisteredType(surrogate.to_string()))
    }

    pub fn schema_for_type(&self, runtime: &RuntimeType) -> CodecResult<&SurrogateSchema> {
        let surrogate = self.registry.surrogate_for(runtime)?;
        self.schema(surrogate)
    }

    pub fn schema_for_instance(
        &self,
        world: &World,
        instance: InstanceId,
    ) -> CodecResult<&SurrogateSchema> {
        let object = world
            .get(instance)
            .ok_or(CodecError::MissingInstance(instance))?;
        self.schema_for_type(&object.runtime_type())
    }

    /// Build the record of `instance`.
    ///
    /// Referenced instances are turned into identities through `identities`,
    /// allocating for any not seen yet.
    pub fn extract(
        &self,
        world: &World,
        instance: InstanceId,
        identities: &mut IdentityStore,
    ) -> CodecResult<SurrogateRecord> {
        let object = world
            .get(instance)
            .ok_or(CodecError::MissingInstance(instance))?;
        let schema = self.schema_for_type(&object.runtime_type())?;
        let identity = identities.identity_of(instance)?;
        let mut record = SurrogateRecord::new(identity, schema.surrogate().clone());

        for field in schema.fields() {
            let stored = match read_field(schema, field, object)? {
                LiveValue::Primitive(p) => FieldValue::Primitive(p),
                LiveValue::Value(v) => {
                    self.registry.surrogate_for(&v.runtime_type())?;
                    FieldValue::Value(v)
                }
                LiveValue::Reference(None) => FieldValue::Ref(Identity::NULL),
                LiveValue::Reference(Some(target)) => {
                    FieldValue::Ref(identities.identity_of(target)?)
                }
                LiveValue::References(targets) => FieldValue::RefList(
                    targets
                        .into_iter()
                        .map(|t| identities.identity_of(t))
                        .collect::<CodecResult<_>>()?,
                ),
            };
            record.set(field.name(), stored);
        }
        trace!(%identity, tag = %record.type_tag, "extracted");
        Ok(record)
    }

    /// An empty instance of the runtime type behind `surrogate`.
    pub fn construct(&self, surrogate: &SurrogateType) -> CodecResult<Box<dyn RuntimeObject>> {
        Ok(self.schema(surrogate)?.construct())
    }

    /// Write `record` into a live instance.
    ///
    /// With `instance` absent a new object is constructed, inserted and bound
    /// to the record's identity first. Fields missing from the record keep
    /// their current value; fields unknown to the schema are ignored.
    pub fn apply(
        &self,
        record: &SurrogateRecord,
        instance: Option<InstanceId>,
        world: &mut World,
        resolver: &mut dyn ResolveIdentity,
    ) -> CodecResult<InstanceId> {
        let schema = self.schema(&record.type_tag)?;
        let instance = match instance {
            Some(id) => {
                let actual = world
                    .runtime_type(id)
                    .ok_or(CodecError::MissingInstance(id))?;
                if actual != schema.runtime() {
                    return Err(CodecError::TypeMismatch {
                        instance: id,
                        expected: schema.runtime().short_name(),
                        actual: actual.short_name(),
                    });
                }
                id
            }
            None => {
                let id = world.insert_boxed(schema.construct());
                if let Err(err) = resolver.bind(record.identity, id) {
                    world.remove(id);
                    return Err(err);
                }
                id
            }
        };

        for field in schema.fields() {
            let Some(stored) = record.get(field.name()) else {
                continue;
            };
            let live = match (field.shape(), stored) {
                (FieldShape::Primitive, FieldValue::Primitive(p)) => {
                    LiveValue::Primitive(p.clone())
                }
                (FieldShape::Value, FieldValue::Value(v)) => {
                    self.registry.surrogate_for(&v.runtime_type())?;
                    LiveValue::Value(v.clone())
                }
                (FieldShape::Reference, FieldValue::Ref(id)) if id.is_null() => {
                    LiveValue::Reference(None)
                }
                (FieldShape::Reference, FieldValue::Ref(id)) => {
                    LiveValue::Reference(Some(resolver.resolve(*id, record.identity, world)?))
                }
                (FieldShape::ReferenceArray, FieldValue::RefList(ids)) => {
                    let mut targets = Vec::with_capacity(ids.len());
                    for id in ids.iter().filter(|id| !id.is_null()) {
                        targets.push(resolver.resolve(*id, record.identity, world)?);
                    }
                    LiveValue::References(targets)
                }
                (shape, other) => {
                    return Err(unsupported(
                        schema,
                        field,
                        format!("declared {shape:?}, stored {}", other.kind_name()),
                    ))
                }
            };
            let object = world
                .get_mut(instance)
                .ok_or(CodecError::MissingInstance(instance))?;
            if !field.set(object, live) {
                return Err(unsupported(schema, field, "stored value does not fit the field"));
            }
        }
        trace!(identity = %record.identity, %instance, "applied");
        Ok(instance)
    }

    /// Identities held by the record's reference fields, deduplicated, in
    /// field order.
    pub fn dependencies_of(&self, record: &SurrogateRecord) -> CodecResult<Vec<Identity>> {
        let schema = self.schema(&record.type_tag)?;
        let mut seen = HashSet::new();
        let mut out = Vec::new();
        for field in schema.reference_fields() {
            let Some(value) = record.get(field.name()) else {
                continue;
            };
            if !matches!(value, FieldValue::Ref(_) | FieldValue::RefList(_)) {
                continue;
            }
            for identity in value.identities() {
                if seen.insert(identity) {
                    out.push(identity);
                }
            }
        }
        Ok(out)
    }

    /// Instances the live object references, deduplicated, in field order.
    pub fn live_dependencies_of(
        &self,
        world: &World,
        instance: InstanceId,
    ) -> CodecResult<Vec<InstanceId>> {
        self.collect_references(world, instance, |_| true)
    }

    /// Instances held in the object's part fields.
    pub fn parts_of(&self, world: &World, instance: InstanceId) -> CodecResult<Vec<InstanceId>> {
        self.collect_references(world, instance, FieldSpec::is_part)
    }

    fn collect_references(
        &self,
        world: &World,
        instance: InstanceId,
        include: impl Fn(&FieldSpec) -> bool,
    ) -> CodecResult<Vec<InstanceId>> {
        let object = world
            .get(instance)
            .ok_or(CodecError::MissingInstance(instance))?;
        let schema = self.schema_for_type(&object.runtime_type())?;
        let mut seen = HashSet::new();
        let mut out = Vec::new();
        for field in schema.reference_fields().filter(|field| include(*field)) {
            let targets = match read_field(schema, field, object)? {
                LiveValue::Reference(target) => target.into_iter().collect(),
                LiveValue::References(targets) => targets,
                _ => Vec::new(),
            };
            for target in targets {
                if seen.insert(target) {
                    out.push(target);
                }
            }
        }
        Ok(out)
    }
}

impl std::fmt::Debug for Codec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Codec")
            .field("types", &self.registry.len())
            .field("schemas", &self.schemas.len())
            .finish()
    }
}

fn read_field(
    schema: &SurrogateSchema,
    field: &FieldSpec,
    object: &dyn RuntimeObject,
) -> CodecResult<LiveValue> {
    let live = field
        .get(object)
        .ok_or_else(|| unsupported(schema, field, "getter rejected the instance"))?;
    if live.shape() != field.shape() {
        return Err(unsupported(
            schema,
            field,
            format!("declared {:?}, produced {:?}", field.shape(), live.shape()),
        ));
    }
    Ok(live)
}

fn unsupported(
    schema: &SurrogateSchema,
    field: &FieldSpec,
    reason: impl Into<String>,
) -> CodecError {
    CodecError::UnsupportedField {
        surrogate: schema.surrogate().clone(),
        field: field.name().to_string(),
        reason: reason.into(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{object_layer, Layer, SchemaBuilder};
    use rtsl_scene::{
        impl_runtime_object, GameObject, Material, Mesh, MeshFilter, MeshRenderer, ObjectBase,
        Transform,
    };
    use rtsl_types::{Primitive, Vector3};

    #[derive(Debug, Default)]
    struct Node {
        base: ObjectBase,
        next: Option<InstanceId>,
        weight: i64,
    }

    impl_runtime_object!(Node);

    #[derive(Debug, Default)]
    struct Stranger {
        base: ObjectBase,
    }

    impl_runtime_object!(Stranger);

    fn node_schema() -> SurrogateSchema {
        SchemaBuilder::<Node>::new("PersistentNode")
            .layer(object_layer())
            .layer(
                Layer::new("Node")
                    .reference("next", |n: &Node| n.next, |n: &mut Node, v| n.next = v)
                    .primitive("weight", |n: &Node| n.weight, |n: &mut Node, v| n.weight = v),
            )
            .build()
            .unwrap()
    }

    fn codec() -> Codec {
        let mut builder = Codec::builder();
        builder.with_builtin_surrogates().unwrap();
        builder.register(node_schema()).unwrap();
        builder.build()
    }

    #[test]
    fn extract_captures_identities_not_objects() {
        let codec = codec();
        let mut world = World::new();
        let b = world.insert(Node::default());
        let a = world.insert(Node {
            base: ObjectBase::named("a"),
            next: Some(b),
            weight: 3,
        });
        let mut ids = IdentityStore::new();
        let record = codec.extract(&world, a, &mut ids).unwrap();
        assert_eq!(record.identity, Identity::compose(0, 1));
        assert_eq!(record.type_tag.as_str(), "PersistentNode");
        assert_eq!(record.get("next"), Some(&FieldValue::Ref(Identity::compose(0, 2))));
        assert_eq!(
            record.get("weight"),
            Some(&FieldValue::Primitive(Primitive::Int(3)))
        );
        assert_eq!(
            record.get("name"),
            Some(&FieldValue::Primitive(Primitive::Str("a".into())))
        );
        assert_eq!(ids.instance_for(Identity::compose(0, 2)), Some(b));
    }

    #[test]
    fn unregistered_runtime_type_fails() {
        let codec = codec();
        let mut world = World::new();
        let s = world.insert(Stranger::default());
        let err = codec
            .extract(&world, s, &mut IdentityStore::new())
            .unwrap_err();
        assert!(matches!(err, CodecError::UnregisteredType(name) if name.contains("Stranger")));
    }

    #[test]
    fn unregistered_value_type_fails() {
        let mut builder = Codec::builder();
        builder
            .register(
                SchemaBuilder::<Transform>::new("PersistentTransform")
                    .layer(Layer::new("Transform").value(
                        "local_position",
                        |t: &Transform| t.local_position,
                        |t: &mut Transform, v| t.local_position = v,
                    ))
                    .build()
                    .unwrap(),
            )
            .unwrap();
        let codec = builder.build();
        let mut world = World::new();
        let t = world.insert(Transform::default());
        let err = codec
            .extract(&world, t, &mut IdentityStore::new())
            .unwrap_err();
        assert!(matches!(err, CodecError::UnregisteredType(name) if name.contains("Vector3")));
    }

    #[test]
    fn mismatched_getter_is_unsupported_field() {
        let schema = SchemaBuilder::<Node>::new("PersistentOddNode")
            .layer(Layer::new("Node").raw(FieldSpec::new(
                "next",
                FieldShape::Reference,
                Box::new(|_: &dyn RuntimeObject| {
                    Some(LiveValue::Primitive(Primitive::Int(1)))
                }),
                Box::new(|_: &mut dyn RuntimeObject, _: LiveValue| false),
            )))
            .build()
            .unwrap();
        let mut builder = Codec::builder();
        builder.register(schema).unwrap();
        let codec = builder.build();
        let mut world = World::new();
        let n = world.insert(Node::default());
        let err = codec
            .extract(&world, n, &mut IdentityStore::new())
            .unwrap_err();
        assert!(matches!(err, CodecError::UnsupportedField { field, .. } if field == "next"));
    }

    #[test]
    fn apply_constructs_and_binds() {
        let codec = codec();
        let mut world = World::new();
        let record = SurrogateRecord::new(
            Identity::compose(0, 1),
            SurrogateType::from_static("PersistentNode"),
        )
        .with_field("weight", FieldValue::Primitive(Primitive::Int(9)))
        .with_field("next", FieldValue::Ref(Identity::NULL))
        .with_field("legacy", FieldValue::Primitive(Primitive::Bool(true)));
        let mut ids = IdentityStore::new();
        let id = codec.apply(&record, None, &mut world, &mut ids).unwrap();
        let node = world.get_as::<Node>(id).unwrap();
        assert_eq!(node.weight, 9);
        assert_eq!(node.next, None);
        assert_eq!(node.base.name, "");
        assert_eq!(ids.instance_for(Identity::compose(0, 1)), Some(id));
    }

    #[test]
    fn apply_removes_constructed_instance_when_bind_fails() {
        let codec = codec();
        let mut world = World::new();
        let holder = world.insert(Node::default());
        let mut ids = IdentityStore::new();
        ids.bind(Identity::compose(0, 1), holder).unwrap();
        let record = SurrogateRecord::new(
            Identity::compose(0, 1),
            SurrogateType::from_static("PersistentNode"),
        );
        let err = codec.apply(&record, None, &mut world, &mut ids).unwrap_err();
        assert!(matches!(err, CodecError::IdentityConflict { .. }));
        assert_eq!(world.len(), 1);
        assert_eq!(ids.instance_for(Identity::compose(0, 1)), Some(holder));
    }

    #[test]
    fn apply_patches_existing_instance() {
        let codec = codec();
        let mut world = World::new();
        let target = world.insert(Node::default());
        let existing = world.insert(Node::default());
        let mut ids = IdentityStore::new();
        ids.bind(Identity::compose(0, 2), target).unwrap();
        let record = SurrogateRecord::new(
            Identity::compose(0, 1),
            SurrogateType::from_static("PersistentNode"),
        )
        .with_field("next", FieldValue::Ref(Identity::compose(0, 2)));
        let id = codec
            .apply(&record, Some(existing), &mut world, &mut ids)
            .unwrap();
        assert_eq!(id, existing);
        assert_eq!(world.get_as::<Node>(existing).unwrap().next, Some(target));
    }

    #[test]
    fn apply_rejects_wrong_instance_type() {
        let codec = codec();
        let mut world = World::new();
        let mesh = world.insert(Mesh::default());
        let record = SurrogateRecord::new(
            Identity::compose(0, 1),
            SurrogateType::from_static("PersistentNode"),
        );
        let err = codec
            .apply(&record, Some(mesh), &mut world, &mut IdentityStore::new())
            .unwrap_err();
        assert!(matches!(err, CodecError::TypeMismatch { .. }));
    }

    #[test]
    fn apply_reports_dangling_and_kind_mismatch() {
        let codec = codec();
        let mut world = World::new();
        let dangling = SurrogateRecord::new(
            Identity::compose(0, 1),
            SurrogateType::from_static("PersistentNode"),
        )
        .with_field("next", FieldValue::Ref(Identity::compose(3, 3)));
        let err = codec
            .apply(&dangling, None, &mut world, &mut IdentityStore::new())
            .unwrap_err();
        assert!(matches!(err, CodecError::DanglingReference { .. }));

        let mismatched = SurrogateRecord::new(
            Identity::compose(0, 2),
            SurrogateType::from_static("PersistentNode"),
        )
        .with_field("weight", FieldValue::Ref(Identity::compose(0, 1)));
        let err = codec
            .apply(&mismatched, None, &mut world, &mut IdentityStore::new())
            .unwrap_err();
        assert!(matches!(err, CodecError::UnsupportedField { field, .. } if field == "weight"));
    }

    #[test]
    fn unknown_tag_is_unregistered() {
        let codec = codec();
        let record = SurrogateRecord::new(
            Identity::compose(0, 1),
            SurrogateType::from_static("PersistentGhost"),
        );
        assert!(matches!(
            codec.dependencies_of(&record),
            Err(CodecError::UnregisteredType(_))
        ));
        assert!(codec.construct(&record.type_tag).is_err());
    }

    #[test]
    fn dependencies_mirror_reference_fields_only() {
        let codec = codec();
        let record = SurrogateRecord::new(
            Identity::compose(0, 1),
            SurrogateType::from_static("PersistentMeshRenderer"),
        )
        .with_field("game_object", FieldValue::Ref(Identity::compose(0, 2)))
        .with_field(
            "shared_materials",
            FieldValue::RefList(vec![
                Identity::compose(0, 3),
                Identity::NULL,
                Identity::compose(0, 3),
                Identity::compose(0, 4),
            ]),
        )
        // not a declared reference field
        .with_field("stray", FieldValue::Ref(Identity::compose(0, 9)));
        assert_eq!(
            codec.dependencies_of(&record).unwrap(),
            vec![
                Identity::compose(0, 2),
                Identity::compose(0, 3),
                Identity::compose(0, 4)
            ]
        );
    }

    #[test]
    fn live_dependencies_and_parts() {
        let codec = codec();
        let mut world = World::new();
        let mesh = world.insert(Mesh::new("m", vec![Vector3::ZERO], vec![]));
        let mat = world.insert(Material::default());
        let root = world.spawn_game_object("root");
        let child = world.spawn_game_object("child");
        world.set_parent(child, Some(root)).unwrap();
        let filter = world.add_component(root, MeshFilter::with_mesh(mesh)).unwrap();
        let renderer = world
            .add_component(root, MeshRenderer::with_materials(vec![mat, mat]))
            .unwrap();
        let transform = world.get_as::<GameObject>(root).unwrap().transform.unwrap();

        let deps = codec.live_dependencies_of(&world, root).unwrap();
        assert_eq!(deps, vec![transform, filter, renderer, child]);
        assert_eq!(
            codec.parts_of(&world, root).unwrap(),
            vec![transform, filter, renderer, child]
        );
        assert_eq!(codec.live_dependencies_of(&world, renderer).unwrap(), vec![root, mat]);
        assert!(codec.parts_of(&world, renderer).unwrap().is_empty());
    }
}
