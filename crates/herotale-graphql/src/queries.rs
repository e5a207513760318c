//! GraphQL operation documents.
//!
//! Field names are the backend's camelCase; identifiers are exposed as
//! `mongoId` and references to other documents as `{ mongoId }` objects.

pub const GET_ALL_SCENARIOS: &str = r"
query GetAllScenarios($publishedOnly: Boolean) {
  allScenarios(publishedOnly: $publishedOnly) {
    mongoId
    title
    description
    isPublished
    createdAt
  }
}
";

pub const GET_SCENARIO: &str = r"
query GetScenario($scenarioId: ID!) {
  scenarioById(scenarioId: $scenarioId) {
    mongoId
    title
    description
    isPublished
    createdAt
  }
}
";

pub const GET_SCENES_BY_SCENARIO: &str = r"
query GetScenesByScenario($scenarioId: ID!) {
  scenesByScenario(scenarioId: $scenarioId) {
    mongoId
    title
    text
    order
    isStartScene
    isEndScene
    imageId { mongoId url }
    soundId { mongoId url }
    musicId { mongoId url }
  }
}
";

pub const GET_CHOICES_BY_SCENE: &str = r"
query GetChoicesByScene($sceneId: ID!) {
  choicesByScene(sceneId: $sceneId) {
    mongoId
    text
    order
    toSceneId { mongoId }
  }
}
";

pub const GET_ME: &str = r"
query GetMe {
  me {
    mongoId
    email
    role
    firstName
    lastName
  }
}
";

pub const GET_MY_PROGRESS: &str = r"
query GetMyProgress {
  myProgress {
    mongoId
    scenarioId { mongoId }
    currentSceneId { mongoId }
    isCompleted
    progressPercentage
    totalTimeSpent
  }
}
";

pub const GET_MY_ASSETS: &str = r"
query GetMyAssets {
  myAssets {
    mongoId
    name
    type
    url
    metadata
  }
}
";

pub const GET_PROGRESS_BY_SCENARIO: &str = r"
query GetProgressByScenario($userId: ID!, $scenarioId: ID!) {
  progressByUserAndScenario(userId: $userId, scenarioId: $scenarioId) {
    mongoId
    scenarioId { mongoId }
    currentSceneId { mongoId }
    isCompleted
    progressPercentage
    totalTimeSpent
    history {
      sceneId { mongoId }
      choiceId { mongoId }
      timestamp
    }
  }
}
";

pub const LOGIN: &str = r"
mutation Login($email: String!, $password: String!) {
  login(email: $email, password: $password) {
    token
    success
    message
  }
}
";

pub const CREATE_USER: &str = r"
mutation CreateUser($input: CreateUserInput!) {
  createUser(input: $input) {
    user {
      mongoId
      email
      role
      firstName
      lastName
    }
    success
    message
  }
}
";

pub const CREATE_PROGRESS: &str = r"
mutation CreateProgress($input: CreateProgressInput!) {
  createProgress(input: $input) {
    progress {
      mongoId
      scenarioId { mongoId }
      currentSceneId { mongoId }
      isCompleted
      progressPercentage
      totalTimeSpent
    }
    success
    message
  }
}
";

pub const RECORD_PROGRESS: &str = r"
mutation RecordProgress($input: RecordProgressInput!) {
  recordProgress(input: $input) {
    success
    message
  }
}
";

pub const UPDATE_PROGRESS: &str = r"
mutation UpdateProgress($progressId: ID!, $input: UpdateProgressInput!) {
  updateProgress(progressId: $progressId, input: $input) {
    success
    message
  }
}
";
