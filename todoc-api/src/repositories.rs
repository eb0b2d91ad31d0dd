use crate::endpoints::{
    CommentId, KidId, PostId, RecordId, SessionId,
    auth::{Login, Me, RefreshToken, Signup},
    chat::{CreateSession, DeleteSession, GetSession, ListSessions, SendMessage},
    community::{
        Category, CreateComment, CreatePost, DeleteComment, DeletePost, GetPost, ListComments,
        ListPosts, ToggleLike, UpdatePost,
    },
    daily_tips::{Language, RandomTip},
    kids::{CreateKid, DeleteKid, GetDashboard, GetKid, Gender, ListKids, UpdateKid, UploadKidPhoto},
    records::{
        CreateRecord, DeleteRecord, ListCategoryRecords, ListRecords, RecordCategory,
    },
};
use crate::request::Upload;
use chrono::NaiveDate;

pub struct AuthRepository;

impl AuthRepository {
    pub fn new() -> Self {
        Self {}
    }

    pub fn login(&self, email: impl Into<String>, password: impl Into<String>) -> Login {
        Login::new(email, password)
    }

    pub fn signup(
        &self,
        email: impl Into<String>,
        password: impl Into<String>,
        username: impl Into<String>,
    ) -> Signup {
        Signup::new(email, password, username)
    }

    pub fn me(&self) -> Me {
        Me
    }

    pub fn refresh(&self, refresh_token: impl Into<String>) -> RefreshToken {
        RefreshToken::new(refresh_token)
    }
}

pub struct KidRepository;

impl KidRepository {
    pub fn new() -> Self {
        Self {}
    }

    pub fn list(&self) -> ListKids {
        ListKids
    }

    pub fn create(&self, name: impl Into<String>, birth_date: NaiveDate, gender: Gender) -> CreateKid {
        CreateKid::new(name, birth_date, gender)
    }

    pub fn get(&self, kid_id: KidId) -> GetKid {
        GetKid::new(kid_id)
    }

    pub fn update(&self, kid_id: KidId) -> UpdateKid {
        UpdateKid::new(kid_id)
    }

    pub fn delete(&self, kid_id: KidId) -> DeleteKid {
        DeleteKid::new(kid_id)
    }

    pub fn upload_photo(&self, kid_id: KidId, upload: Upload) -> UploadKidPhoto {
        UploadKidPhoto::new(kid_id, upload)
    }

    pub fn dashboard(&self, kid_id: KidId) -> GetDashboard {
        GetDashboard::new(kid_id)
    }
}

/// Records are always scoped to one kid
pub struct RecordRepository {
    kid_id: KidId,
}

impl RecordRepository {
    pub fn new(kid_id: KidId) -> Self {
        Self { kid_id }
    }

    pub fn list(&self) -> ListRecords {
        ListRecords::new(self.kid_id)
    }

    pub fn list_category<D: RecordCategory>(&self) -> ListCategoryRecords<D> {
        ListCategoryRecords::new(self.kid_id)
    }

    pub fn create<D: RecordCategory>(&self, detail: D) -> CreateRecord<D> {
        CreateRecord::new(self.kid_id, detail)
    }

    pub fn delete(&self, record_id: RecordId) -> DeleteRecord {
        DeleteRecord::new(self.kid_id, record_id)
    }
}

pub struct ChatRepository;

impl ChatRepository {
    pub fn new() -> Self {
        Self {}
    }

    pub fn sessions(&self, kid_id: KidId) -> ListSessions {
        ListSessions::new(kid_id)
    }

    pub fn create_session(&self, kid_id: KidId) -> CreateSession {
        CreateSession::new(kid_id)
    }

    pub fn session(&self, session_id: SessionId) -> GetSession {
        GetSession::new(session_id)
    }

    pub fn delete_session(&self, session_id: SessionId) -> DeleteSession {
        DeleteSession::new(session_id)
    }

    pub fn send(&self, session_id: SessionId, content: impl Into<String>) -> SendMessage {
        SendMessage::new(session_id, content)
    }
}

pub struct CommunityRepository;

impl CommunityRepository {
    pub fn new() -> Self {
        Self {}
    }

    pub fn posts(&self) -> ListPosts {
        ListPosts::new()
    }

    pub fn create_post(
        &self,
        category: Category,
        title: impl Into<String>,
        content: impl Into<String>,
    ) -> CreatePost {
        CreatePost::new(category, title, content)
    }

    pub fn post(&self, post_id: PostId) -> GetPost {
        GetPost::new(post_id)
    }

    pub fn update_post(&self, post_id: PostId) -> UpdatePost {
        UpdatePost::new(post_id)
    }

    pub fn delete_post(&self, post_id: PostId) -> DeletePost {
        DeletePost::new(post_id)
    }

    pub fn toggle_like(&self, post_id: PostId) -> ToggleLike {
        ToggleLike::new(post_id)
    }

    pub fn comments(&self, post_id: PostId) -> ListComments {
        ListComments::new(post_id)
    }

    pub fn create_comment(&self, post_id: PostId, content: impl Into<String>) -> CreateComment {
        CreateComment::new(post_id, content)
    }

    pub fn delete_comment(&self, comment_id: CommentId) -> DeleteComment {
        DeleteComment::new(comment_id)
    }
}

pub struct DailyTipRepository;

impl DailyTipRepository {
    pub fn new() -> Self {
        Self {}
    }

    pub fn random(&self, language: Language) -> RandomTip {
        RandomTip::new(language)
    }
}
