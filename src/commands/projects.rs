use crate::errors::ProjectListError;
use crate::models::NewProject;
use serde::Deserialize;

// JSON shape accepted from organizers; `vote` is the legacy field name
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ProjectDraft {
    team_name: String,
    project_name: String,
    #[serde(default)]
    description: Option<String>,
    #[serde(alias = "vote")]
    votes: serde_json::Number,
}

/// Parses the `projects` option of `/poll create`.
///
/// Accepts a JSON array of `{teamName, projectName, description?, votes}`
/// objects, or lines of `Team | Project | votes [| description]` separated
/// by `;` or newlines.
pub fn parse_project_list(input: &str) -> Result<Vec<NewProject>, ProjectListError> {
    let input = input.trim();
    let projects = if input.starts_with('[') {
        parse_json(input)?
    } else {
        parse_lines(input)?
    };

    if projects.is_empty() {
        return Err(ProjectListError::Empty);
    }
    Ok(projects)
}

fn parse_json(input: &str) -> Result<Vec<NewProject>, ProjectListError> {
    let drafts: Vec<ProjectDraft> = serde_json::from_str(input)?;
    drafts
        .into_iter()
        .enumerate()
        .map(|(index, draft)| {
            let line = index + 1;
            let votes = draft
                .votes
                .as_i64()
                .filter(|votes| *votes >= 0)
                .ok_or_else(|| ProjectListError::BadVotes { line, value: draft.votes.to_string() })?;
            build(line, &draft.team_name, &draft.project_name, votes, draft.description.as_deref())
        })
        .collect()
}

fn parse_lines(input: &str) -> Result<Vec<NewProject>, ProjectListError> {
    input
        .split(|c: char| c == ';' || c == '\n')
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .enumerate()
        .map(|(index, line)| {
            let number = index + 1;
            let fields: Vec<&str> = line.split('|').map(str::trim).collect();
            if fields.len() < 3 || fields.len() > 4 {
                return Err(ProjectListError::Malformed { line: number });
            }
            let votes = fields[2]
                .parse::<i64>()
                .ok()
                .filter(|votes| *votes >= 0)
                .ok_or_else(|| ProjectListError::BadVotes { line: number, value: fields[2].to_string() })?;
            build(number, fields[0], fields[1], votes, fields.get(3).copied())
        })
        .collect()
}

fn build(
    line: usize,
    team_name: &str,
    project_name: &str,
    votes: i64,
    description: Option<&str>,
) -> Result<NewProject, ProjectListError> {
    let team_name = team_name.trim();
    let project_name = project_name.trim();
    if team_name.is_empty() || project_name.is_empty() {
        return Err(ProjectListError::MissingName { line });
    }

    Ok(NewProject {
        team_name: team_name.to_string(),
        project_name: project_name.to_string(),
        description: description.map(str::trim).filter(|d| !d.is_empty()).map(str::to_string),
        votes,
    })
}
