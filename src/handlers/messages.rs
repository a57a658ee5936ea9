// User-facing bot text. HTML parse mode is used for every message.

pub const INTRO: &str = "Привет! Я помогу разобраться с кожей по селфи.\n\n\
Пришли фото лица анфас при дневном свете, без фильтров и макияжа, \
и я подскажу тип кожи, на что обратить внимание и как выстроить уход.";

pub const CONSENT_REMINDER: &str = "<i>Отправляя фото, ты подтверждаешь, что тебе 16+ \
и соглашаешься на обработку изображения для анализа. Это не медицинская консультация.</i>";

pub const PROCESSING: &str = "Фото получено, анализирую… Это займёт до минуты.";

pub const BAD_QUALITY: &str = "Не получилось разглядеть кожу: фото слишком тёмное или размытое. \
Сделай новое селфи при хорошем освещении, лицо целиком в кадре.";

pub const ERROR: &str = "Что-то пошло не так во время анализа. Попробуй ещё раз чуть позже.";

pub const ASK_FOR_PHOTO: &str = "Пришли, пожалуйста, фото лица, чтобы я смог сделать анализ.";

pub const SAVE_PROMPT: &str = "Хочешь сохранить профиль или получать напоминания об уходе? \
Выбери действие под отчётом.";

pub const SAVE_PROFILE_NOTICE: &str = "Сохранение профиля скоро появится. Пока что отчёт остаётся в этом чате.";

pub const REMINDER_NOTICE: &str = "Напоминания об уходе скоро появятся.";

pub const TERMS_LINK_LABEL: &str = "Условия использования";

pub const PRIVACY_LINK_LABEL: &str = "Политика конфиденциальности";
