//! Fixed user-facing strings.
//!
//! Every failure the login flow can show maps to exactly one message here.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Locale {
    #[default]
    Ko,
    En,
}

impl FromStr for Locale {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "ko" | "ko-kr" => Ok(Locale::Ko),
            "en" | "en-us" => Ok(Locale::En),
            other => Err(format!("unsupported locale: {}", other)),
        }
    }
}

impl fmt::Display for Locale {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Locale::Ko => write!(f, "ko"),
            Locale::En => write!(f, "en"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Message {
    AppTitle,
    Tagline,
    LoginTitle,
    LoginPrompt,
    Email,
    Password,
    RememberMe,
    ShowPassword,
    ForgotPassword,
    LoginButton,
    LoggingIn,
    NoAccount,
    Register,
    BackToHome,
    ErrorTitle,
    NoticeTitle,
    LoginRequired,
    MissingFields,
    InvalidCredentials,
    MyPage,
    MedicalInfo,
    Logout,
    Settings,
    NotLoggedIn,
    QuitPrompt,
}

impl Message {
    pub fn text(self, locale: Locale) -> &'static str {
        match locale {
            Locale::Ko => self.ko(),
            Locale::En => self.en(),
        }
    }

    fn ko(self) -> &'static str {
        match self {
            Message::AppTitle => "FirstAidKeyring",
            Message::Tagline => "생명을 지키는 작은 태그",
            Message::LoginTitle => "로그인",
            Message::LoginPrompt => "FirstAidKeyring 서비스 이용을 위해 로그인해주세요",
            Message::Email => "이메일",
            Message::Password => "비밀번호",
            Message::RememberMe => "로그인 상태 유지",
            Message::ShowPassword => "비밀번호 표시",
            Message::ForgotPassword => "비밀번호 찾기",
            Message::LoginButton => "로그인",
            Message::LoggingIn => "로그인 중...",
            Message::NoAccount => "계정이 없으신가요?",
            Message::Register => "회원가입",
            Message::BackToHome => "홈으로 돌아가기",
            Message::ErrorTitle => "오류",
            Message::NoticeTitle => "알림",
            Message::LoginRequired => "이 기능을 사용하려면 로그인이 필요합니다.",
            Message::MissingFields => "이메일과 비밀번호를 모두 입력해주세요",
            Message::InvalidCredentials => "이메일 또는 비밀번호가 올바르지 않습니다",
            Message::MyPage => "내 정보",
            Message::MedicalInfo => "의료 정보 관리",
            Message::Logout => "로그아웃",
            Message::Settings => "설정",
            Message::NotLoggedIn => "로그인되어 있지 않습니다",
            Message::QuitPrompt => "종료하시겠습니까?",
        }
    }

    fn en(self) -> &'static str {
        match self {
            Message::AppTitle => "First Aid Keyring",
            Message::Tagline => "A small tag that saves lives",
            Message::LoginTitle => "Log in",
            Message::LoginPrompt => "Log in to use FirstAidKeyring",
            Message::Email => "Email",
            Message::Password => "Password",
            Message::RememberMe => "Keep me logged in",
            Message::ShowPassword => "Show password",
            Message::ForgotPassword => "Forgot password",
            Message::LoginButton => "Log in",
            Message::LoggingIn => "Logging in...",
            Message::NoAccount => "Don't have an account?",
            Message::Register => "Sign up",
            Message::BackToHome => "Back to home",
            Message::ErrorTitle => "Error",
            Message::NoticeTitle => "Notice",
            Message::LoginRequired => "You need to log in to use this feature.",
            Message::MissingFields => "Please enter both email and password",
            Message::InvalidCredentials => "Email or password is incorrect",
            Message::MyPage => "My info",
            Message::MedicalInfo => "Medical info",
            Message::Logout => "Log out",
            Message::Settings => "Settings",
            Message::NotLoggedIn => "Not logged in",
            Message::QuitPrompt => "Are you sure you want to quit?",
        }
    }
}
