//! GraphQL documents used by the loader pipelines.
//!
//! Kept as plain string constants so the pinned API version in the URL is
//! the single versioning knob; the documents themselves only use fields
//! stable across the supported version window.

/// Create-or-update one metaobject, keyed by `{type, handle}`.
pub const UPSERT_METAOBJECT: &str = "\
mutation UpsertMetaobject($handle: MetaobjectHandleInput!, $metaobject: MetaobjectUpsertInput!) {
  metaobjectUpsert(handle: $handle, metaobject: $metaobject) {
    metaobject {
      id
      type
      handle
    }
    userErrors {
      field
      message
      code
    }
  }
}";

/// One cursor page of a type's metaobjects.
pub const FETCH_METAOBJECTS: &str = "\
query FetchMetaobjects($type: String!, $first: Int!, $after: String) {
  metaobjects(type: $type, first: $first, after: $after) {
    edges {
      node {
        id
        type
        handle
        fields {
          key
          value
        }
      }
    }
    pageInfo {
      hasNextPage
      endCursor
    }
  }
}";

/// The definition governing a metaobject type.
pub const DEFINITION_BY_TYPE: &str = "\
query MetaobjectDefinitionByType($type: String!) {
  metaobjectDefinitionByType(type: $type) {
    id
    type
    name
    description
    fieldDefinitions {
      key
      name
      description
      required
      type {
        name
      }
      validations {
        name
        value
      }
    }
  }
}";

/// One-shot definition creation.
pub const CREATE_DEFINITION: &str = "\
mutation CreateMetaobjectDefinition($definition: MetaobjectDefinitionCreateInput!) {
  metaobjectDefinitionCreate(definition: $definition) {
    metaobjectDefinition {
      id
      type
      name
    }
    userErrors {
      field
      message
      code
    }
  }
}";

/// Pass-through definition update.
pub const UPDATE_DEFINITION: &str = "\
mutation UpdateMetaobjectDefinition($id: ID!, $definition: MetaobjectDefinitionUpdateInput!) {
  metaobjectDefinitionUpdate(id: $id, definition: $definition) {
    metaobjectDefinition {
      id
      type
      name
    }
    userErrors {
      field
      message
      code
    }
  }
}";

/// Pass-through metaobject deletion.
pub const DELETE_METAOBJECT: &str = "\
mutation DeleteMetaobject($id: ID!) {
  metaobjectDelete(id: $id) {
    deletedId
    userErrors {
      field
      message
      code
    }
  }
}";
