use chrono::Utc;
use rand::seq::SliceRandom;
use rand::Rng;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::error::{Error, Result};
use crate::models::template::Template;
use crate::utils::validation::validate_template;

#[derive(Debug, serde::Serialize)]
pub struct PaginatedTemplates {
    #[serde(rename = "items")]
    pub templates: Vec<TemplateSummary>,
    pub total: usize,
    pub page: usize,
    pub per_page: usize,
    pub total_pages: usize,
}

#[derive(Debug, Clone, serde::Serialize)]
pub struct TemplateSummary {
    pub id: Uuid,
    pub name: String,
    pub version: String,
    pub created_by: Option<String>,
    pub grading_scale: String,
    pub total_questions: usize,
    pub total_weight: f64,
    pub created_at: Option<chrono::DateTime<Utc>>,
}

impl From<&Template> for TemplateSummary {
    fn from(t: &Template) -> Self {
        Self {
            id: t.id.unwrap_or_default(),
            name: t.name.clone(),
            version: t.version.clone(),
            created_by: t.created_by.clone(),
            grading_scale: t.grading_scale.to_string(),
            total_questions: t.questions.len(),
            total_weight: t.total_weight(),
            created_at: t.created_at,
        }
    }
}

#[derive(Debug, Default)]
pub struct TemplateFilter {
    pub search: Option<String>,
    pub created_by: Option<String>,
}

#[derive(Clone)]
pub struct TemplateService {
    templates: Arc<RwLock<HashMap<Uuid, Template>>>,
    max_versions: u32,
}

impl TemplateService {
    pub fn new(max_versions: u32) -> Self {
        Self {
            templates: Arc::new(RwLock::new(HashMap::new())),
            max_versions,
        }
    }

    /// Numbers questions by position, validates, and stores the template
    /// under a fresh id. With `multiple_versions` one shuffled copy per
    /// version letter is stored instead, and all of them are returned.
    pub async fn create_template(&self, mut template: Template) -> Result<Vec<Template>> {
        template.renumber();
        template.dedupe_question_ids();
        if let Err(report) = validate_template(&template) {
            tracing::warn!("Rejected template '{}': {}", template.name, report);
            return Err(Error::InvalidTemplate(report));
        }
        if template.multiple_versions && template.version_count > self.max_versions {
            return Err(Error::BadRequest(format!(
                "At most {} versions can be generated",
                self.max_versions
            )));
        }

        let stored = if template.multiple_versions {
            let mut rng = rand::thread_rng();
            generate_versions(&template, &mut rng)
        } else {
            vec![template]
        };

        let mut guard = self.templates.write().await;
        let now = Utc::now();
        let mut created = Vec::with_capacity(stored.len());
        for mut t in stored {
            let id = Uuid::new_v4();
            t.id = Some(id);
            t.created_at = Some(now);
            guard.insert(id, t.clone());
            created.push(t);
        }

        tracing::info!(
            "Stored template '{}' ({} version(s), {} questions)",
            created[0].name,
            created.len(),
            created[0].questions.len()
        );
        Ok(created)
    }

    /// Stores a previously exported template under a new id.
    pub async fn import_template(&self, mut template: Template) -> Result<Template> {
        template.id = None;
        template.multiple_versions = false;
        let mut created = self.create_template(template).await?;
        Ok(created.remove(0))
    }

    pub async fn duplicate_template(&self, template_id: Uuid) -> Result<Template> {
        let mut copy = self.get_template(template_id).await?;
        copy.name = format!("{} (copy)", copy.name);
        for question in &mut copy.questions {
            question.id = Uuid::new_v4();
        }
        self.import_template(copy).await
    }

    pub async fn get_template(&self, template_id: Uuid) -> Result<Template> {
        self.templates
            .read()
            .await
            .get(&template_id)
            .cloned()
            .ok_or_else(|| Error::NotFound(format!("Template {} not found", template_id)))
    }

    pub async fn list_templates(
        &self,
        page: usize,
        per_page: usize,
        filter: Option<TemplateFilter>,
    ) -> PaginatedTemplates {
        let filter = filter.unwrap_or_default();
        let search = filter.search.map(|s| s.to_lowercase());

        let guard = self.templates.read().await;
        let mut matching: Vec<&Template> = guard
            .values()
            .filter(|t| match &search {
                Some(s) => {
                    t.name.to_lowercase().contains(s)
                        || t.instructions
                            .as_deref()
                            .is_some_and(|i| i.to_lowercase().contains(s))
                }
                None => true,
            })
            .filter(|t| match &filter.created_by {
                Some(author) => t.created_by.as_deref() == Some(author.as_str()),
                None => true,
            })
            .collect();
        matching.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(a.name.cmp(&b.name)));

        let total = matching.len();
        let per_page = per_page.max(1);
        let page = page.max(1);
        let total_pages = total.div_ceil(per_page).max(1);

        let templates = matching
            .into_iter()
            .skip((page - 1) * per_page)
            .take(per_page)
            .map(TemplateSummary::from)
            .collect();

        PaginatedTemplates {
            templates,
            total,
            page,
            per_page,
            total_pages,
        }
    }

    /// Removes one question and renumbers the rest. The edit is only kept if
    /// the template still validates.
    pub async fn delete_question(&self, template_id: Uuid, question_id: Uuid) -> Result<Template> {
        let mut guard = self.templates.write().await;
        let stored = guard
            .get_mut(&template_id)
            .ok_or_else(|| Error::NotFound(format!("Template {} not found", template_id)))?;

        let mut edited = stored.clone();
        edited.delete_question(question_id)?;
        validate_template(&edited).map_err(Error::InvalidTemplate)?;

        *stored = edited.clone();
        tracing::info!(
            "Deleted question {} from template {} ({} left)",
            question_id,
            template_id,
            edited.questions.len()
        );
        Ok(edited)
    }

    pub async fn count(&self) -> usize {
        self.templates.read().await.len()
    }

    /// Deletion is terminal.
    pub async fn delete_template(&self, template_id: Uuid) -> Result<Template> {
        let removed = self.templates.write().await.remove(&template_id);
        match removed {
            Some(t) => {
                tracing::info!("Deleted template {} ('{}')", template_id, t.name);
                Ok(t)
            }
            None => Err(Error::NotFound(format!("Template {} not found", template_id))),
        }
    }
}

/// One copy per version letter. Version A keeps the authored order; later
/// versions shuffle the questions and renumber them.
pub fn generate_versions<R: Rng + ?Sized>(template: &Template, rng: &mut R) -> Vec<Template> {
    let count = template.version_count.clamp(1, 26);
    (0..count)
        .map(|i| {
            let mut version = template.clone();
            version.version = char::from(b'A' + i as u8).to_string();
            version.multiple_versions = false;
            version.version_count = 1;
            if i > 0 {
                version.questions.shuffle(rng);
                version.renumber();
            }
            version
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::question::{Question, QuestionType};
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use tokio_test::{assert_err, assert_ok};

    fn sample(name: &str, questions: usize) -> Template {
        let mut template = Template::new(name);
        for _ in 0..questions {
            let mut q = Question::new(QuestionType::MultipleChoice);
            q.correct_answers = vec!["A".into()];
            template.add_question(q);
        }
        template
    }

    #[test]
    fn versions_are_renumbered_permutations() {
        let mut template = sample("Versioned", 6);
        template.multiple_versions = true;
        template.version_count = 3;

        let mut rng = StdRng::seed_from_u64(7);
        let versions = generate_versions(&template, &mut rng);
        assert_eq!(versions.len(), 3);

        let letters: Vec<&str> = versions.iter().map(|v| v.version.as_str()).collect();
        assert_eq!(letters, vec!["A", "B", "C"]);

        let original: Vec<Uuid> = template.questions.iter().map(|q| q.id).collect();
        assert_eq!(
            versions[0].questions.iter().map(|q| q.id).collect::<Vec<_>>(),
            original
        );

        for version in &versions {
            let numbers: Vec<u32> = version.questions.iter().map(|q| q.number).collect();
            assert_eq!(numbers, (1..=6).collect::<Vec<u32>>());

            let mut ids: Vec<Uuid> = version.questions.iter().map(|q| q.id).collect();
            let mut expected = original.clone();
            ids.sort();
            expected.sort();
            assert_eq!(ids, expected);
            assert!(!version.multiple_versions);
        }
    }

    #[tokio::test]
    async fn create_rejects_invalid_templates() {
        let service = TemplateService::new(26);
        let err = assert_err!(service.create_template(Template::new("Q")).await);
        assert!(matches!(err, Error::InvalidTemplate(_)));
        assert_eq!(service.count().await, 0);
    }

    #[tokio::test]
    async fn create_get_list_and_delete() {
        let service = TemplateService::new(26);
        let first = service.create_template(sample("Algebra", 2)).await.unwrap();
        let second = service.create_template(sample("Geometry", 3)).await.unwrap();
        let first_id = first[0].id.unwrap();

        let fetched = service.get_template(first_id).await.unwrap();
        assert_eq!(fetched.name, "Algebra");
        assert!(fetched.created_at.is_some());

        let all = service.list_templates(1, 10, None).await;
        assert_eq!(all.total, 2);

        let filtered = service
            .list_templates(
                1,
                10,
                Some(TemplateFilter {
                    search: Some("geo".into()),
                    created_by: None,
                }),
            )
            .await;
        assert_eq!(filtered.total, 1);
        assert_eq!(filtered.templates[0].name, "Geometry");
        assert_eq!(filtered.templates[0].total_questions, 3);

        let paged = service.list_templates(2, 1, None).await;
        assert_eq!(paged.templates.len(), 1);
        assert_eq!(paged.total_pages, 2);

        service.delete_template(first_id).await.unwrap();
        assert!(matches!(
            service.get_template(first_id).await,
            Err(Error::NotFound(_))
        ));
        assert!(matches!(
            service.delete_template(first_id).await,
            Err(Error::NotFound(_))
        ));
        assert!(service.get_template(second[0].id.unwrap()).await.is_ok());
    }

    #[tokio::test]
    async fn multiple_versions_store_one_template_per_letter() {
        let service = TemplateService::new(26);
        let mut template = sample("Versioned", 4);
        template.multiple_versions = true;
        template.version_count = 2;

        let created = assert_ok!(service.create_template(template).await);
        assert_eq!(created.len(), 2);
        assert_ne!(created[0].id, created[1].id);
        assert_eq!(service.count().await, 2);
    }

    #[tokio::test]
    async fn version_count_is_capped_by_configuration() {
        let service = TemplateService::new(2);
        let mut template = sample("Versioned", 4);
        template.multiple_versions = true;
        template.version_count = 3;

        let err = service.create_template(template).await.unwrap_err();
        assert!(matches!(err, Error::BadRequest(_)));
    }

    #[tokio::test]
    async fn deleting_a_question_renumbers_but_keeps_templates_valid() {
        let service = TemplateService::new(26);
        let created = service.create_template(sample("Chemistry", 3)).await.unwrap();
        let template = &created[0];
        let id = template.id.unwrap();

        let edited = service
            .delete_question(id, template.questions[0].id)
            .await
            .unwrap();
        let numbers: Vec<u32> = edited.questions.iter().map(|q| q.number).collect();
        assert_eq!(numbers, vec![1, 2]);
        assert_eq!(edited.questions[0].id, template.questions[1].id);

        assert!(matches!(
            service.delete_question(id, Uuid::new_v4()).await,
            Err(Error::NotFound(_))
        ));

        service
            .delete_question(id, template.questions[1].id)
            .await
            .unwrap();
        let err = service
            .delete_question(id, template.questions[2].id)
            .await
            .unwrap_err();
        assert!(matches!(err, Error::InvalidTemplate(_)));
        assert_eq!(service.get_template(id).await.unwrap().questions.len(), 1);
    }

    #[tokio::test]
    async fn created_templates_have_distinct_question_ids() {
        let service = TemplateService::new(26);
        let mut template = sample("Shared ids", 3);
        let shared = template.questions[0].id;
        template.questions[1].id = shared;

        let created = assert_ok!(service.create_template(template).await);
        let stored = &created[0];
        assert_ne!(stored.questions[0].id, stored.questions[1].id);

        let id = stored.id.unwrap();
        let edited = assert_ok!(service.delete_question(id, stored.questions[1].id).await);
        assert_eq!(edited.questions.len(), 2);
        assert_eq!(edited.questions[0].id, shared);
    }

    #[tokio::test]
    async fn duplicate_gets_fresh_ids() {
        let service = TemplateService::new(26);
        let created = service.create_template(sample("History", 2)).await.unwrap();
        let original = &created[0];

        let copy = service
            .duplicate_template(original.id.unwrap())
            .await
            .unwrap();
        assert_eq!(copy.name, "History (copy)");
        assert_ne!(copy.id, original.id);
        assert_ne!(copy.questions[0].id, original.questions[0].id);
        assert_eq!(service.count().await, 2);
    }
}
