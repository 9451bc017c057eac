// PropertyCollector query engine
//
// The one generic primitive every vSphere inventory call is built on:
// object type + property paths + traversal specs in, parsed objects out.

use std::fmt::Write as _;

use quick_xml::escape::escape;
use tracing::debug;

use crate::error::Error;
use crate::soap::{VIM25_NS, envelope};
use crate::traversal::{TraversalDef, build_select_set, merge_folder_traversal};
use crate::vsphere::client::VsphereSession;
use crate::xml::{ParsedObject, parse_return_values};

/// A single `RetrieveProperties` request.
#[derive(Debug, Clone)]
pub struct PropertyQuery<'a> {
    /// Managed object type to collect, e.g. `Datastore`.
    pub object_type: &'a str,
    /// Property paths to return for each object.
    pub property_paths: &'a [&'a str],
    /// Traversals from the root folder to the objects.
    pub traversals: Vec<TraversalDef>,
}

impl<'a> PropertyQuery<'a> {
    pub fn new(
        object_type: &'a str,
        property_paths: &'a [&'a str],
        traversals: Vec<TraversalDef>,
    ) -> Self {
        Self {
            object_type,
            property_paths,
            traversals,
        }
    }
}

impl VsphereSession {
    /// Run a property-collector query starting at the root folder.
    ///
    /// A non-200 answer (typically an expired session) yields an empty
    /// result instead of an error.
    pub async fn retrieve_properties(
        &self,
        query: &PropertyQuery<'_>,
    ) -> Result<Vec<ParsedObject>, Error> {
        let body = envelope(&self.retrieve_properties_body(query));
        let resp = self
            .soap
            .post(body, "RetrieveProperties", &self.cookies)
            .await?;

        if !resp.is_ok() {
            debug!(
                object_type = query.object_type,
                status = resp.status,
                "RetrieveProperties failed, returning no objects"
            );
            return Ok(Vec::new());
        }

        let objects = parse_return_values(&resp.body);
        debug!(
            object_type = query.object_type,
            count = objects.len(),
            "retrieved properties"
        );
        Ok(objects)
    }

    /// The `RetrieveProperties` operation element for `query`.
    pub(crate) fn retrieve_properties_body(&self, query: &PropertyQuery<'_>) -> String {
        let traversals = merge_folder_traversal(&query.traversals);

        let mut paths = String::new();
        for path in query.property_paths {
            let _ = write!(paths, "<pathSet>{}</pathSet>", escape(*path));
        }

        format!(
            concat!(
                r#"<RetrieveProperties xmlns="{ns}">"#,
                r#"<_this type="PropertyCollector">{pc}</_this>"#,
                "<specSet>",
                "<propSet><type>{obj_type}</type>{paths}</propSet>",
                r#"<objectSet><obj type="Folder">{root}</obj><skip>true</skip>{select}</objectSet>"#,
                "</specSet>",
                "</RetrieveProperties>"
            ),
            ns = VIM25_NS,
            pc = escape(self.property_collector.value.as_str()),
            obj_type = escape(query.object_type),
            paths = paths,
            root = escape(self.root_folder.value.as_str()),
            select = build_select_set(&traversals),
        )
    }
}
